use actix_web::{HttpResponse, HttpResponseBuilder, Responder, get, post, web};
use handlebars::Handlebars;
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::folio::config::SiteSettings;
use crate::folio::promos::Product;
use crate::folio::types::{Post, RenderedPost};
use crate::folio::{PostRenderer, WordPressClient};

pub fn config(conf: &mut web::ServiceConfig) {
    let api_scope = web::scope("/api")
        .service(healthcheck_handler)
        .service(render_handler);

    conf.service(api_scope);
    conf.service(blog_post_handler);
}

#[get("/health")]
pub async fn healthcheck_handler() -> impl Responder {
    HttpResponse::Ok().json(json!({ "message": "pong" }))
}

/// Body accepted by `POST /api/render`.
#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub html: String,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub products: Option<Vec<Product>>,
}

impl RenderRequest {
    fn into_post(self) -> Post {
        let mut post = Post::new(
            self.slug.unwrap_or_else(|| "preview".into()),
            self.title.unwrap_or_default(),
            self.html,
        );
        post.featured_image = self.featured_image;
        post.products = self
            .products
            .and_then(|products| serde_json::to_string(&products).ok());
        post
    }
}

#[post("/render")]
pub async fn render_handler(
    renderer: web::Data<PostRenderer>,
    body: web::Json<RenderRequest>,
) -> impl Responder {
    let post = body.into_inner().into_post();
    match renderer.render(post) {
        Ok(Some(rendered)) => HttpResponse::Ok().json(rendered),
        Ok(None) => HttpResponse::NotFound().finish(),
        Err(err) => {
            error!("failed to render preview: {err:#}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/blog/{slug}")]
pub async fn blog_post_handler(
    path: web::Path<String>,
    renderer: web::Data<PostRenderer>,
    client: web::Data<WordPressClient>,
    hb: web::Data<Handlebars<'static>>,
) -> impl Responder {
    let slug = path.into_inner();

    let post = match client.fetch_post(&slug).await {
        Ok(Some(post)) => post,
        Ok(None) => {
            info!("no post for slug {slug}");
            return HttpResponse::NotFound().finish();
        }
        Err(err) => {
            error!("failed to fetch post {slug}: {err:#}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let rendered = match renderer.render(post) {
        Ok(Some(rendered)) => rendered,
        Ok(None) => return HttpResponse::NotFound().finish(),
        Err(err) => {
            error!("failed to render post {slug}: {err:#}");
            return HttpResponse::InternalServerError().finish();
        }
    };

    let ctx = PageContext {
        site: &renderer.config.site,
        post: &rendered,
    };
    render(hb, "post", json!(ctx), HttpResponse::Ok())
}

#[derive(Serialize)]
struct PageContext<'a> {
    site: &'a SiteSettings,
    post: &'a RenderedPost,
}

fn render(
    hb: web::Data<Handlebars<'static>>,
    template: &str,
    data: serde_json::Value,
    mut builder: HttpResponseBuilder,
) -> HttpResponse {
    match hb.render(template, &data) {
        Ok(body) => builder.content_type("text/html; charset=utf-8").body(body),
        Err(err) => {
            error!("template {template} failed: {err}");
            HttpResponse::InternalServerError().body(format!("Template error: {}", err))
        }
    }
}
