use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use uploadstream::{FilePayload, HttpTransport, UploadEvent, UploadManager, UploadRequest};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("\n📤 uploadstream - Upload Session Demo");
    println!("=====================================\n");

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .context("usage: upload_demo <file> [endpoint] [bearer-token]")?;
    let endpoint = args
        .next()
        .unwrap_or_else(|| "http://localhost:8888/api/upload/".to_string());
    let token = args.next();

    let data = tokio::fs::read(&path)
        .await
        .with_context(|| format!("reading {path}"))?;
    let filename = Path::new(&path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload.bin")
        .to_string();

    let manager = UploadManager::new(Arc::new(HttpTransport::new()?));

    let mut request = UploadRequest::new(
        FilePayload::new(filename.clone(), "application/zip", data),
        &endpoint,
    );
    if let Some(token) = token {
        request = request.with_auth_token(token);
    }

    let handle = manager.start_upload(request)?;
    println!("✅ Session {} started", handle.id());
    println!("   File: {filename}");
    println!("   Endpoint: {endpoint}\n");

    let mut events = handle.take_events().expect("fresh handle");
    while let Some(event) = events.recv().await {
        match event {
            UploadEvent::Progress(percent) => {
                println!("   ⏳ {percent:3}%");
            }
            UploadEvent::Settled(Ok(receipt)) => {
                println!("\n✅ Upload stored as {}", receipt.id);
            }
            UploadEvent::Settled(Err(err)) => {
                println!("\n❌ Upload failed: {err}");
            }
        }
    }

    println!("   Final state: {:?}", handle.info().state);

    Ok(())
}
