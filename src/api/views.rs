// Page rendering
//
// Handlers hand a template name and a JSON document to a `TemplateRenderer`.
// `BuiltinRenderer` produces plain HTML for every page without any template
// files on disk; a deployment with real templates plugs in its own renderer.

use serde_json::Value;
use std::fmt::Write as _;

use crate::{ForumError, Result};

/// Turns a template name plus page data into HTML
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, template: &str, data: &Value) -> Result<String>;
}

/// Escape text for HTML element content and quoted attribute values
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Minimal HTML pages for the forum
#[derive(Debug, Clone, Default)]
pub struct BuiltinRenderer;

impl BuiltinRenderer {
    pub const TEMPLATES: [&'static str; 6] = [
        "home.html",
        "login.html",
        "register.html",
        "create-post.html",
        "edit-post.html",
        "view-post.html",
    ];

    pub fn new() -> Self {
        Self
    }
}

impl TemplateRenderer for BuiltinRenderer {
    fn render(&self, template: &str, data: &Value) -> Result<String> {
        let (title, body) = match template {
            "home.html" => ("Great Forums", home(data)),
            "login.html" => ("Log in", login(data)),
            "register.html" => ("Register", register(data)),
            "create-post.html" => ("New post", post_form(data, "/create-post", "Publish")),
            "edit-post.html" => {
                let action = format!("/edit-post/{}", int(data, "post_id"));
                ("Edit post", post_form(data, &action, "Save"))
            }
            "view-post.html" => ("Post", view_post(data)),
            other => return Err(ForumError::Template(format!("unknown template '{}'", other))),
        };
        Ok(layout(title, &data["user"], &body))
    }
}

fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value[key].as_str().unwrap_or_default()
}

fn int(value: &Value, key: &str) -> i64 {
    value[key].as_i64().unwrap_or_default()
}

fn items<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value[key].as_array().map(Vec::as_slice).unwrap_or_default()
}

fn layout(title: &str, user: &Value, body: &str) -> String {
    let nav = if user.is_null() {
        r#"<a href="/login">Log in</a> <a href="/register">Register</a>"#.to_string()
    } else {
        format!(
            r#"<span>Signed in as {}</span> <a href="/create-post">New post</a> <form method="post" action="/logout" class="inline"><button type="submit">Log out</button></form>"#,
            escape_html(text(user, "username"))
        )
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title}</title>
<link rel="stylesheet" href="/static/style.css">
<script src="/static/forum.js" defer></script>
</head>
<body>
<header><a href="/">Great Forums</a> <nav>{nav}</nav></header>
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape_html(title),
        nav = nav,
        body = body
    )
}

fn notice(data: &Value) -> String {
    let mut html = String::new();
    if let Some(error) = data["error"].as_str() {
        let _ = write!(html, r#"<p class="error">{}</p>"#, escape_html(error));
    }
    if let Some(message) = data["message"].as_str() {
        let _ = write!(html, r#"<p class="message">{}</p>"#, escape_html(message));
    }
    html
}

fn reactions(kind: &str, id: i64, item: &Value) -> String {
    let pressed = |reaction: &str| {
        if item["user_reaction"].as_str() == Some(reaction) {
            " active"
        } else {
            ""
        }
    };
    format!(
        r#"<div class="reactions" data-{kind}-id="{id}"><button class="like{like_active}" data-is-like="true">👍 <span class="likes">{likes}</span></button> <button class="dislike{dislike_active}" data-is-like="false">👎 <span class="dislikes">{dislikes}</span></button></div>"#,
        kind = kind,
        id = id,
        like_active = pressed("like"),
        dislike_active = pressed("dislike"),
        likes = int(item, "likes"),
        dislikes = int(item, "dislikes")
    )
}

fn category_tags(post: &Value) -> String {
    let tags: Vec<String> = items(post, "categories")
        .iter()
        .filter_map(Value::as_str)
        .map(|name| format!(r#"<span class="category">{}</span>"#, escape_html(name)))
        .collect();
    tags.join(" ")
}

fn home(data: &Value) -> String {
    let selected = data["selected_category"].as_i64();
    let mut html = String::from("<section class=\"categories\"><h2>Categories</h2><ul>");
    let _ = write!(html, r#"<li><a href="/">All</a></li>"#);
    for category in items(data, "categories") {
        let id = int(category, "id");
        let class = if selected == Some(id) { " class=\"active\"" } else { "" };
        let _ = write!(
            html,
            r#"<li{}><a href="/?category={}">{}</a></li>"#,
            class,
            id,
            escape_html(text(category, "name"))
        );
    }
    html.push_str("</ul></section>");

    match data["selected_category_name"].as_str() {
        Some(name) => {
            let _ = write!(
                html,
                "<section class=\"posts\"><h2>Posts in {}</h2>",
                escape_html(name)
            );
        }
        None => html.push_str("<section class=\"posts\"><h2>Recent posts</h2>"),
    }
    let posts = items(data, "posts");
    if posts.is_empty() {
        html.push_str("<p>No posts yet.</p>");
    }
    for post in posts {
        let id = int(post, "id");
        let _ = write!(
            html,
            r#"<article><h3><a href="/post/{id}">{title}</a></h3><p class="meta">by {author} on {date}</p><p>{tags}</p>{reactions}</article>"#,
            id = id,
            title = escape_html(text(post, "title")),
            author = escape_html(text(post, "author")),
            date = escape_html(text(post, "formatted_created_at")),
            tags = category_tags(post),
            reactions = reactions("post", id, post)
        );
    }
    html.push_str("</section>");
    html
}

fn login(data: &Value) -> String {
    format!(
        r#"<h1>Log in</h1>{notice}<form method="post" action="/login">
<label>Username <input type="text" name="username" value="{username}" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Log in</button>
</form>"#,
        notice = notice(data),
        username = escape_html(text(data, "username"))
    )
}

fn register(data: &Value) -> String {
    format!(
        r#"<h1>Register</h1>{notice}<form method="post" action="/register">
<label>Username <input type="text" name="username" value="{username}" required></label>
<label>Email <input type="email" name="email" value="{email}" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Create account</button>
</form>"#,
        notice = notice(data),
        username = escape_html(text(data, "username")),
        email = escape_html(text(data, "email"))
    )
}

fn post_form(data: &Value, action: &str, submit: &str) -> String {
    let mut boxes = String::new();
    for category in items(data, "categories") {
        let checked = if category["selected"].as_bool().unwrap_or(false) {
            " checked"
        } else {
            ""
        };
        let _ = write!(
            boxes,
            r#"<label><input type="checkbox" name="categories" value="{}"{}> {}</label>"#,
            int(category, "id"),
            checked,
            escape_html(text(category, "name"))
        );
    }

    format!(
        r#"{notice}<form method="post" action="{action}">
<label>Title <input type="text" name="title" value="{title}" required></label>
<label>Content <textarea name="content" required>{content}</textarea></label>
<fieldset><legend>Categories</legend>{boxes}</fieldset>
<button type="submit">{submit}</button>
</form>"#,
        notice = notice(data),
        action = escape_html(action),
        title = escape_html(text(data, "title")),
        content = escape_html(text(data, "content")),
        boxes = boxes,
        submit = escape_html(submit)
    )
}

fn view_post(data: &Value) -> String {
    let post = &data["post"];
    let post_id = int(post, "id");
    let logged_in = !data["user"].is_null();

    let mut html = format!(
        r#"<article class="post"><h1>{title}</h1><p class="meta">by {author} on {date}{edited}</p><p>{tags}</p><div class="content">{content}</div>{reactions}</article>"#,
        title = escape_html(text(post, "title")),
        author = escape_html(text(post, "author")),
        date = escape_html(text(post, "formatted_created_at")),
        edited = if post["was_edited"].as_bool().unwrap_or(false) { " (edited)" } else { "" },
        tags = category_tags(post),
        content = escape_html(text(post, "content")),
        reactions = reactions("post", post_id, post)
    );

    if data["is_author"].as_bool().unwrap_or(false) {
        let _ = write!(
            html,
            r#"<p class="actions"><a href="/edit-post/{id}">Edit</a> <form method="post" action="/delete-post/{id}" class="inline"><button type="submit">Delete</button></form></p>"#,
            id = post_id
        );
    }

    html.push_str("<section class=\"comments\"><h2>Comments</h2>");
    for comment in items(data, "comments") {
        let _ = write!(
            html,
            r#"<div class="comment"><p class="meta">{author} on {date}</p><p>{content}</p>{reactions}</div>"#,
            author = escape_html(text(comment, "author")),
            date = escape_html(text(comment, "formatted_created_at")),
            content = escape_html(text(comment, "content")),
            reactions = reactions("comment", int(comment, "id"), comment)
        );
    }

    if logged_in {
        let _ = write!(
            html,
            r#"<form method="post" action="/comment"><input type="hidden" name="post_id" value="{}"><textarea name="content" required></textarea><button type="submit">Comment</button></form>"#,
            post_id
        );
    } else {
        html.push_str(r#"<p><a href="/login">Log in</a> to comment.</p>"#);
    }
    html.push_str("</section>");
    html
}
