use actix_files::Files;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use std::path::Path;

use crate::admin;
use crate::auth::{self, CurrentUser};
use crate::comments::CommentForm;
use crate::error::BlogError;
use crate::state::AppState;
use crate::templates::PageMeta;
use crate::users::User;

/// 表单请求体上限，文章正文与评论均为自由文本
pub const FORM_LIMIT: usize = 8 * 1024 * 1024;

/// 注册表单
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl RegisterForm {
    pub fn is_valid(&self) -> bool {
        self.email.contains('@') && !self.password.is_empty() && !self.name.trim().is_empty()
    }
}

/// 登录表单
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn is_valid(&self) -> bool {
        !self.email.trim().is_empty() && !self.password.is_empty()
    }
}

/// 模板所需的访客信息，并读取请求中的待显示提示
pub(crate) fn page_meta<'a>(req: &HttpRequest, user: Option<&'a User>) -> PageMeta<'a> {
    PageMeta {
        current_user: user,
        is_admin: user.map_or(false, auth::is_admin),
        notice: auth::pending_notice(req),
    }
}

/// HTML 响应；提示显示后清除提示 cookie
pub(crate) fn html_page(meta: &PageMeta, html: String) -> HttpResponse {
    let mut response = HttpResponse::Ok();
    response.content_type("text/html; charset=utf-8");
    if meta.notice.is_some() {
        response.cookie(auth::clear_flash_cookie());
    }
    response.body(html)
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .append_header((header::LOCATION, location))
        .finish()
}

/// 文章列表
pub async fn index(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, BlogError> {
    let posts = state.db()?.get_all_posts()?;
    let meta = page_meta(&req, user.0.as_ref());
    let html = state.renderer.render_index(&meta, &posts)?;
    Ok(html_page(&meta, html))
}

pub async fn register_page(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, BlogError> {
    let meta = page_meta(&req, user.0.as_ref());
    let html = state.renderer.render_register(&meta, "", "", false)?;
    Ok(html_page(&meta, html))
}

/// 注册账号并登录
pub async fn register(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: CurrentUser,
    form: web::Form<RegisterForm>,
) -> Result<HttpResponse, BlogError> {
    let form = form.into_inner();

    if !form.is_valid() {
        let meta = page_meta(&req, user.0.as_ref());
        let html = state
            .renderer
            .render_register(&meta, &form.email, &form.name, true)?;
        return Ok(html_page(&meta, html));
    }

    let new_user = state.register_user(form.email.trim(), &form.password, form.name.trim())?;
    log::info!("Registered user {} ({})", new_user.id, new_user.email);

    let session = auth::session_cookie(&state.cookie_key, new_user.id)
        .ok_or_else(|| BlogError::Internal("failed to sign session cookie".to_string()))?;

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/"))
        .cookie(session)
        .finish())
}

pub async fn login_page(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, BlogError> {
    let meta = page_meta(&req, user.0.as_ref());
    let html = state.renderer.render_login(&meta, "", false)?;
    Ok(html_page(&meta, html))
}

/// 校验凭据并开始会话
pub async fn login(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: CurrentUser,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse, BlogError> {
    let form = form.into_inner();

    if !form.is_valid() {
        let meta = page_meta(&req, user.0.as_ref());
        let html = state.renderer.render_login(&meta, &form.email, true)?;
        return Ok(html_page(&meta, html));
    }

    let logged_in = state.verify_login(form.email.trim(), &form.password)?;
    log::info!("User {} logged in", logged_in.id);

    let session = auth::session_cookie(&state.cookie_key, logged_in.id)
        .ok_or_else(|| BlogError::Internal("failed to sign session cookie".to_string()))?;

    Ok(HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/"))
        .cookie(session)
        .finish())
}

pub async fn logout() -> impl Responder {
    HttpResponse::SeeOther()
        .append_header((header::LOCATION, "/"))
        .cookie(auth::clear_session_cookie())
        .finish()
}

/// 文章详情及评论
pub async fn show_post(
    req: HttpRequest,
    path: web::Path<i64>,
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, BlogError> {
    let post_id = path.into_inner();
    log::debug!("Showing post {}", post_id);

    let (post, comments) = {
        let db = state.db()?;
        let post = db.get_post(post_id)?.ok_or(BlogError::PostNotFound(post_id))?;
        let comments = db.get_comments_by_post(post_id)?;
        (post, comments)
    };

    let meta = page_meta(&req, user.0.as_ref());
    let html = state.renderer.render_post(&meta, &post, &comments, false)?;
    Ok(html_page(&meta, html))
}

/// 添加评论；先校验表单再检查会话
pub async fn add_comment(
    req: HttpRequest,
    path: web::Path<i64>,
    state: web::Data<AppState>,
    user: CurrentUser,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse, BlogError> {
    let post_id = path.into_inner();
    let form = form.into_inner();

    let post = state
        .db()?
        .get_post(post_id)?
        .ok_or(BlogError::PostNotFound(post_id))?;

    if !form.is_valid() {
        let comments = state.db()?.get_comments_by_post(post_id)?;
        let meta = page_meta(&req, user.0.as_ref());
        let html = state.renderer.render_post(&meta, &post, &comments, true)?;
        return Ok(html_page(&meta, html));
    }

    let author = user.0.ok_or(BlogError::AuthenticationRequired)?;
    let comment = state
        .db()?
        .add_comment(post.id, author.id, form.comment_text.trim())?;
    log::info!("Comment {} added to post {} by user {}", comment.id, post.id, author.id);

    Ok(redirect(&format!("/post/{}", post.id)))
}

pub async fn about(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, BlogError> {
    let meta = page_meta(&req, user.0.as_ref());
    let html = state.renderer.render_static(&meta, "about.html")?;
    Ok(html_page(&meta, html))
}

pub async fn contact(
    req: HttpRequest,
    state: web::Data<AppState>,
    user: CurrentUser,
) -> Result<HttpResponse, BlogError> {
    let meta = page_meta(&req, user.0.as_ref());
    let html = state.renderer.render_static(&meta, "contact.html")?;
    Ok(html_page(&meta, html))
}

/// 健康检查
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "daily_blog"
    }))
}

/// 目录存在时提供静态资源
pub fn configure_static(cfg: &mut web::ServiceConfig, static_dir: &Path) {
    if static_dir.is_dir() {
        cfg.service(Files::new("/static", static_dir));
    } else {
        log::debug!("Static directory {} not found, skipping", static_dir.display());
    }
}

/// 配置路由
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::FormConfig::default().limit(FORM_LIMIT));
    admin::configure_admin_routes(cfg);

    cfg.route("/health", web::get().to(health_check))
        .route("/", web::get().to(index))
        .route("/register", web::get().to(register_page))
        .route("/register", web::post().to(register))
        .route("/login", web::get().to(login_page))
        .route("/login", web::post().to(login))
        .route("/logout", web::get().to(logout))
        .route("/post/{post_id}", web::get().to(show_post))
        .route("/post/{post_id}", web::post().to(add_comment))
        .route("/about", web::get().to(about))
        .route("/contact", web::get().to(contact));
}
