use crate::auth::Notice;
use crate::comments::Comment;
use crate::config::{Config, SiteConfig};
use crate::error::BlogError;
use crate::markdown;
use crate::posts::{Post, PostFields};
use crate::users::User;
use tera::{Context, Tera};

/// 每个页面共用的访问者信息
pub struct PageMeta<'a> {
    pub current_user: Option<&'a User>,
    pub is_admin: bool,
    pub notice: Option<Notice>,
}

pub struct TemplateRenderer {
    tera: Tera,
    site: SiteConfig,
}

impl TemplateRenderer {
    pub fn new(config: &Config) -> Result<Self, BlogError> {
        let builtin = Self::create_builtin_templates()?;

        let tera = if config.paths.templates_dir.exists() {
            let pattern = format!("{}/**/*.html", config.paths.templates_dir.display());
            log::debug!("Looking for templates with pattern: {}", pattern);

            match Tera::new(&pattern) {
                Ok(mut t) => {
                    log::info!(
                        "Loaded {} templates from directory",
                        t.get_template_names().count()
                    );
                    // 磁盘模板优先，内置模板补缺
                    t.extend(&builtin)?;
                    t
                }
                Err(e) => {
                    log::warn!("Failed to load templates: {}", e);
                    log::info!("Using built-in templates");
                    builtin
                }
            }
        } else {
            log::info!("Using built-in templates");
            builtin
        };

        Ok(Self {
            tera,
            site: config.site.clone(),
        })
    }

    fn create_builtin_templates() -> Result<Tera, BlogError> {
        let mut tera = Tera::default();

        tera.add_raw_templates(vec![
            ("base.html", BASE_TEMPLATE),
            ("index.html", INDEX_TEMPLATE),
            ("post.html", POST_TEMPLATE),
            ("login.html", LOGIN_TEMPLATE),
            ("register.html", REGISTER_TEMPLATE),
            ("make-post.html", MAKE_POST_TEMPLATE),
            ("about.html", ABOUT_TEMPLATE),
            ("contact.html", CONTACT_TEMPLATE),
        ])?;

        Ok(tera)
    }

    fn context(&self, meta: &PageMeta) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        context.insert("current_user", &meta.current_user);
        context.insert("is_admin", &meta.is_admin);
        context.insert("notice", &meta.notice.map(|n| n.message()));
        context
    }

    pub fn render_index(&self, meta: &PageMeta, posts: &[Post]) -> Result<String, BlogError> {
        let mut context = self.context(meta);
        context.insert("all_posts", posts);
        Ok(self.tera.render("index.html", &context)?)
    }

    pub fn render_post(
        &self,
        meta: &PageMeta,
        post: &Post,
        comments: &[Comment],
        form_error: bool,
    ) -> Result<String, BlogError> {
        let mut context = self.context(meta);
        context.insert("post", post);
        context.insert("body_html", &markdown::render_body(&post.body));
        context.insert("comments", comments);
        context.insert("form_error", &form_error);
        Ok(self.tera.render("post.html", &context)?)
    }

    pub fn render_login(&self, meta: &PageMeta, email: &str, form_error: bool) -> Result<String, BlogError> {
        let mut context = self.context(meta);
        context.insert("email", email);
        context.insert("form_error", &form_error);
        Ok(self.tera.render("login.html", &context)?)
    }

    pub fn render_register(
        &self,
        meta: &PageMeta,
        email: &str,
        name: &str,
        form_error: bool,
    ) -> Result<String, BlogError> {
        let mut context = self.context(meta);
        context.insert("email", email);
        context.insert("name", name);
        context.insert("form_error", &form_error);
        Ok(self.tera.render("register.html", &context)?)
    }

    /// 新建与编辑共用 make-post.html；编辑时 post_id 为 Some
    pub fn render_make_post(
        &self,
        meta: &PageMeta,
        fields: &PostFields,
        post_id: Option<i64>,
        form_error: bool,
    ) -> Result<String, BlogError> {
        let mut context = self.context(meta);
        context.insert("form", fields);
        context.insert("is_edit", &post_id.is_some());
        context.insert("post_id", &post_id);
        context.insert("form_error", &form_error);
        Ok(self.tera.render("make-post.html", &context)?)
    }

    pub fn render_static(&self, meta: &PageMeta, template: &str) -> Result<String, BlogError> {
        let context = self.context(meta);
        Ok(self.tera.render(template, &context)?)
    }
}

const BASE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{% block title %}{{ site.title }}{% endblock title %}</title>
    <meta name="description" content="{{ site.description }}">
    <style>
        * { box-sizing: border-box; }
        body {
            margin: 0;
            font-family: 'Lora', Georgia, 'Times New Roman', serif;
            color: #212529;
            line-height: 1.6;
        }
        nav {
            display: flex;
            justify-content: space-between;
            align-items: center;
            padding: 16px 32px;
            background: #212529;
        }
        nav a {
            color: #fff;
            text-decoration: none;
            margin-left: 20px;
            font-family: 'Open Sans', Arial, sans-serif;
            font-size: 0.8em;
            font-weight: 800;
            letter-spacing: 1px;
            text-transform: uppercase;
        }
        nav .brand { margin-left: 0; font-size: 1em; }
        header.masthead {
            padding: 120px 32px 80px;
            background-color: #6c757d;
            background-size: cover;
            background-position: center;
            color: #fff;
            text-align: center;
        }
        header.masthead h1 { font-size: 3em; margin: 0; }
        header.masthead .subheading { font-size: 1.4em; font-weight: 300; }
        main { max-width: 760px; margin: 0 auto; padding: 40px 20px; }
        .notice {
            background: #fff3cd;
            border: 1px solid #ffe69c;
            padding: 12px 16px;
            border-radius: 6px;
            margin-bottom: 24px;
        }
        .form-error { color: #b02a37; }
        .post-preview { border-bottom: 1px solid #dee2e6; padding: 16px 0; }
        .post-preview a { color: #212529; text-decoration: none; }
        .post-preview h2 { margin: 0 0 8px; }
        .post-preview h3 { margin: 0 0 8px; font-weight: 300; }
        .post-meta { color: #6c757d; font-style: italic; }
        form label { display: block; margin: 12px 0 4px; font-weight: 600; }
        form input, form textarea {
            width: 100%;
            padding: 10px;
            border: 1px solid #ced4da;
            border-radius: 4px;
            font: inherit;
        }
        form textarea { min-height: 200px; }
        .btn {
            display: inline-block;
            margin-top: 16px;
            padding: 10px 24px;
            background: #0085a1;
            color: #fff;
            border: none;
            border-radius: 4px;
            text-decoration: none;
            text-transform: uppercase;
            cursor: pointer;
        }
        .comments { list-style: none; padding: 0; }
        .comments li { border-top: 1px solid #dee2e6; padding: 12px 0; }
        .comments .author { color: #6c757d; font-size: 0.9em; }
        footer { text-align: center; color: #6c757d; padding: 40px 0; }
    </style>
</head>
<body>
    <nav>
        <a class="brand" href="/">{{ site.title }}</a>
        <div>
            <a href="/">Home</a>
            {% if current_user %}
            <a href="/logout">Log Out</a>
            {% else %}
            <a href="/login">Login</a>
            <a href="/register">Register</a>
            {% endif %}
            <a href="/about">About</a>
            <a href="/contact">Contact</a>
        </div>
    </nav>
    {% block header %}{% endblock header %}
    <main>
        {% if notice %}
        <div class="notice">{{ notice }}</div>
        {% endif %}
        {% block content %}{% endblock content %}
    </main>
    <footer>
        <p>Copyright &copy; {{ site.author }}</p>
    </footer>
</body>
</html>"#;

const INDEX_TEMPLATE: &str = r#"{% extends "base.html" %}
{% block header %}
<header class="masthead">
    <h1>{{ site.title }}</h1>
    <span class="subheading">{{ site.description }}</span>
</header>
{% endblock header %}
{% block content %}
{% for post in all_posts %}
<div class="post-preview">
    <a href="/post/{{ post.id }}">
        <h2>{{ post.title }}</h2>
        <h3>{{ post.subtitle }}</h3>
    </a>
    <p class="post-meta">
        Posted by {{ post.author_name }} on {{ post.date }}
        {% if is_admin %}<a href="/delete/{{ post.id }}">✘</a>{% endif %}
    </p>
</div>
{% endfor %}
{% if all_posts | length == 0 %}
<p>No posts yet.</p>
{% endif %}
{% if is_admin %}
<a class="btn" href="/new-post">Create New Post</a>
{% endif %}
{% endblock content %}"#;

const POST_TEMPLATE: &str = r#"{% extends "base.html" %}
{% block title %}{{ post.title }} - {{ site.title }}{% endblock title %}
{% block header %}
<header class="masthead" style="background-image: url('{{ post.img_url }}')">
    <h1>{{ post.title }}</h1>
    <h2 class="subheading">{{ post.subtitle }}</h2>
    <span class="post-meta">Posted by {{ post.author_name }} on {{ post.date }}</span>
</header>
{% endblock header %}
{% block content %}
<article>
    {{ body_html | safe }}
</article>
{% if is_admin %}
<a class="btn" href="/edit-post/{{ post.id }}">Edit Post</a>
{% endif %}

<h3>Comments</h3>
<form method="POST" action="/post/{{ post.id }}">
    {% if form_error %}<p class="form-error">Please write a comment before submitting.</p>{% endif %}
    <label for="comment_text">Comment</label>
    <textarea id="comment_text" name="comment_text"></textarea>
    <button type="submit" class="btn">Submit Comment</button>
</form>
<ul class="comments">
    {% for comment in comments %}
    <li>
        <p>{{ comment.text }}</p>
        <span class="author">{{ comment.author_name }}</span>
    </li>
    {% endfor %}
</ul>
{% endblock content %}"#;

const LOGIN_TEMPLATE: &str = r#"{% extends "base.html" %}
{% block title %}Log In - {{ site.title }}{% endblock title %}
{% block content %}
<h1>Log In</h1>
<p>Welcome back!</p>
<form method="POST" action="/login">
    {% if form_error %}<p class="form-error">Email and password are required.</p>{% endif %}
    <label for="email">Email</label>
    <input type="email" id="email" name="email" value="{{ email }}" required>
    <label for="password">Password</label>
    <input type="password" id="password" name="password" required>
    <button type="submit" class="btn">Let Me In!</button>
</form>
{% endblock content %}"#;

const REGISTER_TEMPLATE: &str = r#"{% extends "base.html" %}
{% block title %}Register - {{ site.title }}{% endblock title %}
{% block content %}
<h1>Register</h1>
<p>Start contributing to the blog!</p>
<form method="POST" action="/register">
    {% if form_error %}<p class="form-error">Email, password and name are required.</p>{% endif %}
    <label for="email">Email</label>
    <input type="email" id="email" name="email" value="{{ email }}" required>
    <label for="password">Password</label>
    <input type="password" id="password" name="password" required>
    <label for="name">Name</label>
    <input type="text" id="name" name="name" value="{{ name }}" required>
    <button type="submit" class="btn">Sign Me Up!</button>
</form>
{% endblock content %}"#;

const MAKE_POST_TEMPLATE: &str = r#"{% extends "base.html" %}
{% block title %}{% if is_edit %}Edit Post{% else %}New Post{% endif %} - {{ site.title }}{% endblock title %}
{% block content %}
<h1>{% if is_edit %}Edit Post{% else %}New Post{% endif %}</h1>
<form method="POST" action="{% if is_edit %}/edit-post/{{ post_id }}{% else %}/new-post{% endif %}">
    {% if form_error %}<p class="form-error">All fields are required.</p>{% endif %}
    <label for="title">Blog Post Title</label>
    <input type="text" id="title" name="title" value="{{ form.title }}" required>
    <label for="subtitle">Subtitle</label>
    <input type="text" id="subtitle" name="subtitle" value="{{ form.subtitle }}" required>
    <label for="img_url">Blog Image URL</label>
    <input type="url" id="img_url" name="img_url" value="{{ form.img_url }}" required>
    <label for="body">Blog Content</label>
    <textarea id="body" name="body" required>{{ form.body }}</textarea>
    <button type="submit" class="btn">Submit Post</button>
</form>
{% endblock content %}"#;

const ABOUT_TEMPLATE: &str = r#"{% extends "base.html" %}
{% block title %}About - {{ site.title }}{% endblock title %}
{% block content %}
<h1>About Me</h1>
<p>{{ site.description }}</p>
<p>This blog is written by {{ site.author }}.</p>
{% endblock content %}"#;

const CONTACT_TEMPLATE: &str = r#"{% extends "base.html" %}
{% block title %}Contact - {{ site.title }}{% endblock title %}
{% block content %}
<h1>Contact Me</h1>
<p>Have questions? Leave a comment on any post and {{ site.author }} will get back to you.</p>
{% endblock content %}"#;
