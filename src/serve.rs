//! 本地预览：
//! - 内置极简 HTTP 静态文件服务器，根目录为生成产物所在目录
//! - 绑定成功后在默认浏览器中打开

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::{debug, warn};
use tiny_http::{Header, Method, Request, Response, Server};

use crate::error::HuggableError;

pub(crate) struct StaticServer {
    server: Server,
    root: PathBuf,
    url: String,
}

impl StaticServer {
    /// 绑定 `<host>:<port>`；端口被占用时返回 `PortInUse`
    pub(crate) fn bind(root: &Path, host: &str, port: u16) -> Result<Self, HuggableError> {
        if !root.is_dir() {
            return Err(HuggableError::io(
                root,
                io::Error::new(io::ErrorKind::NotFound, "预览目录不存在"),
            ));
        }
        let addr = format!("{}:{}", host, port);
        let server = Server::http(&addr).map_err(|e| bind_error(&addr, port, e))?;
        // 端口 0 时使用实际分配的端口
        let actual_port = server.server_addr().to_ip().map(|a| a.port()).unwrap_or(port);
        let url = format!("http://{}:{}", host, actual_port);
        Ok(StaticServer { server, root: root.to_path_buf(), url })
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    /// 在默认浏览器中打开；失败只提示，不中断服务
    pub(crate) fn open_browser(&self) {
        if let Err(e) = webbrowser::open(&self.url) {
            warn!("无法自动打开浏览器: {}", e);
            println!("请手动访问: {}", self.url);
        }
    }

    /// 阻塞处理请求，直到进程被中断
    pub(crate) fn run(self) {
        for rq in self.server.incoming_requests() {
            handle(&self.root, rq);
        }
    }
}

fn bind_error(addr: &str, port: u16, e: Box<dyn std::error::Error + Send + Sync>) -> HuggableError {
    match e.downcast::<io::Error>() {
        Ok(io_err) if io_err.kind() == io::ErrorKind::AddrInUse => {
            HuggableError::PortInUse { addr: addr.to_string(), port }
        }
        Ok(io_err) => HuggableError::io(addr, *io_err),
        Err(other) => HuggableError::io(addr, io::Error::new(io::ErrorKind::Other, other.to_string())),
    }
}

/// URL 路径 → 根目录下的文件；过滤 `.` / `..` 与空段，目录请求映射到 index.html
fn resolve_path(root: &Path, url: &str) -> PathBuf {
    let path_only = url.split(['?', '#']).next().unwrap_or("/");
    let mut fpath = root.to_path_buf();
    let mut any = false;
    for seg in path_only.split('/') {
        let t = seg.trim();
        if t.is_empty() || t == "." || t == ".." || t.contains('\\') {
            continue;
        }
        fpath.push(t);
        any = true;
    }
    if !any || path_only.ends_with('/') || fpath.is_dir() {
        fpath.push("index.html");
    }
    fpath
}

fn handle(root: &Path, rq: Request) {
    let method = rq.method().clone();
    debug!("{} {}", method, rq.url());
    if method != Method::Get && method != Method::Head {
        let _ = rq.respond(Response::from_string("Method Not Allowed").with_status_code(405));
        return;
    }
    let fpath = resolve_path(root, rq.url());
    let resp = match fs::read(&fpath) {
        Ok(bytes) => {
            let ct = content_type_for_path(&fpath);
            let mut resp = Response::from_data(bytes);
            if let Ok(h) = Header::from_bytes(&b"Content-Type"[..], ct.as_bytes()) {
                resp.add_header(h);
            }
            resp
        }
        Err(_) => Response::from_data(b"Not Found".to_vec()).with_status_code(404),
    };
    let _ = rq.respond(resp);
}

fn content_type_for_path(p: &Path) -> &'static str {
    match p.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase().as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "application/javascript; charset=utf-8",
        "json" => "application/json; charset=utf-8",
        "txt" => "text/plain; charset=utf-8",
        "svg" => "image/svg+xml",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        _ => "application/octet-stream",
    }
}
