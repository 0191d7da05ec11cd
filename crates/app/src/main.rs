mod api;
mod client;
mod config;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use config::{Cli, Command, EmbeddingProvider, ServeArgs, VectorBackend};
use report_rag_core::{
    ChatModel, Embedder, HashingEmbedder, LocalVectorStore, OpenAiChatModel, OpenAiConfig,
    OpenAiEmbedder, QdrantStore, QueryService, UploadStore, VectorIndex,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => serve(args).await?,
        Command::Upload { client, file } => {
            let result = client::ApiClient::new(&client.api_url).upload(&file).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Ask { client, question } => {
            let answer = client::ApiClient::new(&client.api_url).ask(&question).await?;
            client::print_answer(&question, &answer);
        }
        Command::Reset { client } => {
            let result = client::ApiClient::new(&client.api_url).reset().await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        started_at = %Utc::now().to_rfc3339(),
        "report-rag boot"
    );

    let openai = || -> anyhow::Result<OpenAiConfig> {
        let api_key = args
            .openai_api_key
            .clone()
            .context("OPENAI_API_KEY is required for OpenAI embeddings and chat")?;
        Ok(OpenAiConfig::new(&args.openai_base_url, api_key)?)
    };

    let embedder: Arc<dyn Embedder> = match args.embedding_provider {
        EmbeddingProvider::Openai => Arc::new(OpenAiEmbedder::new(
            openai()?,
            &args.embedding_model,
            args.embedding_dimensions,
        )),
        EmbeddingProvider::Hashing => Arc::new(HashingEmbedder::default()),
    };

    let index: Arc<dyn VectorIndex> = match args.vector_backend {
        VectorBackend::Local => Arc::new(
            LocalVectorStore::open(&args.persist_dir, &args.collection, embedder).await?,
        ),
        VectorBackend::Qdrant => {
            Arc::new(QdrantStore::new(&args.qdrant_url, &args.collection, embedder))
        }
    };

    let chat: Arc<dyn ChatModel> = Arc::new(OpenAiChatModel::new(
        openai()?,
        &args.chat_model,
        args.temperature,
    ));
    let query = QueryService::new(index.clone(), chat).with_top_k(args.top_k);

    let state = api::AppState {
        index,
        query: Arc::new(query),
        uploads: UploadStore::new(&args.upload_dir),
        loader: args.pdf_loader.into(),
    };
    let app = api::router(state, args.max_upload_bytes);

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    info!(
        bind = %args.bind,
        backend = ?args.vector_backend,
        collection = %args.collection,
        upload_dir = %args.upload_dir.display(),
        "listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
}
