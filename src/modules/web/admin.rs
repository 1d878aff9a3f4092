use actix_web::{web, HttpRequest, HttpResponse};

use crate::auth::AdminUser;
use crate::error::BlogError;
use crate::posts::PostFields;
use crate::routes::{html_page, page_meta, redirect};
use crate::state::AppState;

/// 新建文章页面
pub async fn new_post_page(
    admin: AdminUser,
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, BlogError> {
    let meta = page_meta(&req, Some(&admin.0));
    let html = state
        .renderer
        .render_make_post(&meta, &PostFields::default(), None, false)?;
    Ok(html_page(&meta, html))
}

/// 创建文章处理
pub async fn create_post(
    admin: AdminUser,
    req: HttpRequest,
    state: web::Data<AppState>,
    form: web::Form<PostFields>,
) -> Result<HttpResponse, BlogError> {
    let fields = form.into_inner();

    if !fields.is_valid() {
        let meta = page_meta(&req, Some(&admin.0));
        let html = state.renderer.render_make_post(&meta, &fields, None, true)?;
        return Ok(html_page(&meta, html));
    }

    let post = state.db()?.create_post(&fields, admin.0.id)?;
    log::info!("Post {} created: {}", post.id, post.title);

    Ok(redirect("/"))
}

/// 编辑文章页面
pub async fn edit_post_page(
    admin: AdminUser,
    req: HttpRequest,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, BlogError> {
    let post_id = path.into_inner();
    let post = state
        .db()?
        .get_post(post_id)?
        .ok_or(BlogError::PostNotFound(post_id))?;

    let meta = page_meta(&req, Some(&admin.0));
    let html = state
        .renderer
        .render_make_post(&meta, &PostFields::from(&post), Some(post.id), false)?;
    Ok(html_page(&meta, html))
}

/// 更新文章处理
pub async fn update_post(
    admin: AdminUser,
    req: HttpRequest,
    path: web::Path<i64>,
    state: web::Data<AppState>,
    form: web::Form<PostFields>,
) -> Result<HttpResponse, BlogError> {
    let post_id = path.into_inner();
    let fields = form.into_inner();

    if !fields.is_valid() {
        if state.db()?.get_post(post_id)?.is_none() {
            return Err(BlogError::PostNotFound(post_id));
        }
        let meta = page_meta(&req, Some(&admin.0));
        let html = state
            .renderer
            .render_make_post(&meta, &fields, Some(post_id), true)?;
        return Ok(html_page(&meta, html));
    }

    if !state.db()?.update_post(post_id, &fields)? {
        return Err(BlogError::PostNotFound(post_id));
    }
    log::info!("Post {} updated", post_id);

    Ok(redirect(&format!("/post/{}", post_id)))
}

/// 删除文章处理（评论随之删除）
pub async fn delete_post(
    _admin: AdminUser,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, BlogError> {
    let post_id = path.into_inner();

    if !state.db()?.delete_post(post_id)? {
        return Err(BlogError::PostNotFound(post_id));
    }
    log::info!("Post {} deleted", post_id);

    Ok(redirect("/"))
}

/// 配置管理员路由
pub fn configure_admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/new-post", web::get().to(new_post_page))
        .route("/new-post", web::post().to(create_post))
        .route("/edit-post/{post_id}", web::get().to(edit_post_page))
        .route("/edit-post/{post_id}", web::post().to(update_post))
        .route("/delete/{post_id}", web::get().to(delete_post));
}
