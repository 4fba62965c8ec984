use quill_http::codec::ResponseBuilder;
use quill_http::codec::body::Multipart;
use quill_http::protocol::{CompressionMethod, StatusCode};
use quill_web::cache::{self, Cacheable};
use quill_web::handler::{HandlerError, handler_fn};
use quill_web::logging::LogLevel;
use quill_web::router::{Router, get, post};
use quill_web::static_files::StaticDirectory;
use quill_web::{RequestContext, Server, json};
use serde::Serialize;
use std::time::{Duration, SystemTime};

#[derive(Serialize)]
struct Post<'a> {
    slug: &'a str,
    page: u32,
}

fn index(request: &RequestContext<'_, '_>, response: &mut ResponseBuilder) -> Result<(), HandlerError> {
    response.append_response(request.request(), StatusCode::OK, Some(b"text/html; charset=utf-8".as_slice()), b"<h1>quill blog</h1>");
    Ok(())
}

fn show_post(request: &RequestContext<'_, '_>, response: &mut ResponseBuilder) -> Result<(), HandlerError> {
    let slug = request.route_params().get_as::<&str>(b"post")?;
    let page = request.query().get_as::<u32>(b"page").unwrap_or(1);
    json::append_json(response, request.request(), StatusCode::OK, &Post { slug, page })?;
    Ok(())
}

fn about(request: &RequestContext<'_, '_>, response: &mut ResponseBuilder) -> Result<(), HandlerError> {
    let published = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
    let cacheable = Cacheable::public(3600, b"\"about-v1\"")?.with_last_modified(published)?;

    if !cache::is_stale(request.request(), &cacheable) {
        cache::append_not_modified(response, request.request(), &cacheable);
        return Ok(());
    }

    let content = b"quill is a small http server";
    response.append_status_line(request.request().version(), StatusCode::OK);
    response.append_header(b"Content-Type", b"text/plain");
    response.append_content_length(content.len());
    cache::append_cache_headers(response, &cacheable);
    response.append_line_end();
    response.start_content();
    response.append(content);
    Ok(())
}

fn upload(request: &RequestContext<'_, '_>, response: &mut ResponseBuilder) -> Result<(), HandlerError> {
    let form = Multipart::from_request(request.request())?;
    let names: Vec<String> = form.iter().map(|item| String::from_utf8_lossy(item.name()).into_owned()).collect();
    let body = format!("received {}", names.join(", "));
    response.append_response(request.request(), StatusCode::OK, Some(b"text/plain".as_slice()), body.as_bytes());
    Ok(())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let router = Router::builder()
        .route("/", get(handler_fn(index)))
        .route("/about", get(handler_fn(about)))
        .route("/blog/{post}", get(handler_fn(show_post)))
        .route("/upload", post(handler_fn(upload)))
        .build();

    Server::builder()
        .router(router)
        .address("127.0.0.1:3000")
        .supported_compression(CompressionMethod::GZIP | CompressionMethod::BROTLI)
        .static_files(StaticDirectory::new("public"))
        .log_level(LogLevel::Debug)
        .build()
        .map_err(std::io::Error::other)?
        .start()
        .await
}
