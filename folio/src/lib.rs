pub mod folio;
pub mod handlers;

use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::Path;

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, middleware::Logger, web};
use handlebars::Handlebars;
use log::{error, info};
use walkdir::WalkDir;

use crate::folio::{PostRenderer, SiteConfig, WordPressClient};

pub async fn run() -> io::Result<()> {
    let config = SiteConfig::load();
    let server_cfg = config.server.clone();

    info!(
        "Folio is listening on: http://{}:{}",
        server_cfg.host, server_cfg.port
    );

    let handlebars = web::Data::new(build_handlebars().map_err(io::Error::other)?);
    let client = web::Data::new(WordPressClient::new(&config.cms).map_err(|err| {
        error!("cms client setup failed: {err:#}");
        io::Error::other(err)
    })?);
    let renderer = web::Data::new(PostRenderer::new(config));

    let max_bytes = server_cfg.max_payload_bytes();
    let cors_origins = server_cfg.cors_origins.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(renderer.clone())
            .app_data(client.clone())
            .app_data(handlebars.clone())
            .app_data(web::PayloadConfig::new(max_bytes))
            .app_data(web::JsonConfig::default().limit(max_bytes))
            .wrap(build_cors(&cors_origins))
            .configure(handlers::config)
    })
    .bind((server_cfg.host.as_str(), server_cfg.port))?
    .run()
    .await
}

fn build_cors(origins: &[String]) -> Cors {
    let base = Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT]);

    if origins.iter().any(|o| o == "*") {
        return base.allow_any_origin();
    }

    origins
        .iter()
        .fold(base, |c, origin| c.allowed_origin(origin))
}

/// Register every `.hbs` file under `templates/`. Top-level files become
/// templates named by their stem, nested ones partials named by relative path.
pub fn build_handlebars() -> anyhow::Result<Handlebars<'static>> {
    let templates_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("templates");
    register_templates(&templates_dir)
}

pub fn register_templates(templates_dir: &Path) -> anyhow::Result<Handlebars<'static>> {
    use anyhow::Context;

    let mut handlebars = Handlebars::new();
    handlebars.set_strict_mode(false);

    for entry in WalkDir::new(templates_dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.path().is_file() && e.path().extension() == Some(OsStr::new("hbs")))
    {
        let path = entry.path();
        let rel = path.strip_prefix(templates_dir)?;
        let rel_no_ext = rel.with_extension("");
        let name = rel_no_ext.to_string_lossy().replace('\\', "/");

        if rel.parent().map(|p| p == Path::new("")).unwrap_or(true) {
            handlebars
                .register_template_file(&name, path)
                .with_context(|| format!("failed to register template {name}"))?;
        } else {
            let partial_src = fs::read_to_string(path)
                .with_context(|| format!("failed to read partial {name}"))?;
            handlebars
                .register_partial(&name, partial_src)
                .with_context(|| format!("failed to register partial {name}"))?;
        }
    }

    Ok(handlebars)
}
