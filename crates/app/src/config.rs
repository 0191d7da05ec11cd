use clap::{Args, Parser, Subcommand, ValueEnum};
use report_rag_core::{
    LoaderKind, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL,
    DEFAULT_TOP_K,
};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "report-rag", version, about = "Question answering over ingested PDF reports")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Upload a PDF to a running API for ingestion.
    Upload {
        #[command(flatten)]
        client: ClientArgs,
        /// PDF file to upload.
        file: PathBuf,
    },
    /// Ask a question against the ingested reports.
    Ask {
        #[command(flatten)]
        client: ClientArgs,
        /// The question to ask.
        question: String,
    },
    /// Clear the vector index of a running API.
    Reset {
        #[command(flatten)]
        client: ClientArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ClientArgs {
    /// Base URL of the API
    #[arg(long, env = "API_URL", default_value = "http://127.0.0.1:8000")]
    pub api_url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VectorBackend {
    /// JSON-persisted collection under --persist-dir
    Local,
    /// Qdrant collection at --qdrant-url
    Qdrant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EmbeddingProvider {
    Openai,
    /// Offline character-trigram hashing
    Hashing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PdfLoader {
    Lopdf,
    PdfExtract,
}

impl From<PdfLoader> for LoaderKind {
    fn from(value: PdfLoader) -> Self {
        match value {
            PdfLoader::Lopdf => LoaderKind::Lopdf,
            PdfLoader::PdfExtract => LoaderKind::PdfExtract,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "RAG_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// Directory holding the persisted vector collection
    #[arg(long, env = "RAG_PERSIST_DIR", default_value = "./chroma")]
    pub persist_dir: PathBuf,

    /// Collection name
    #[arg(long, env = "RAG_COLLECTION", default_value = "pdf_collection")]
    pub collection: String,

    /// Directory uploaded PDFs are written to
    #[arg(long, env = "RAG_UPLOAD_DIR", default_value = "./data/uploaded")]
    pub upload_dir: PathBuf,

    #[arg(long, env = "RAG_VECTOR_BACKEND", value_enum, default_value = "local")]
    pub vector_backend: VectorBackend,

    /// Qdrant base URL
    #[arg(long, env = "QDRANT_URL", default_value = "http://localhost:6333")]
    pub qdrant_url: String,

    #[arg(long, env = "RAG_EMBEDDING_PROVIDER", value_enum, default_value = "openai")]
    pub embedding_provider: EmbeddingProvider,

    #[arg(long, env = "RAG_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    pub embedding_model: String,

    #[arg(long, env = "RAG_EMBEDDING_DIMENSIONS", default_value_t = DEFAULT_EMBEDDING_DIMENSIONS)]
    pub embedding_dimensions: usize,

    #[arg(long, env = "RAG_CHAT_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    pub chat_model: String,

    #[arg(long, env = "RAG_TEMPERATURE", default_value_t = 0.0)]
    pub temperature: f32,

    #[arg(long, env = "OPENAI_BASE_URL", default_value = report_rag_core::openai::DEFAULT_BASE_URL)]
    pub openai_base_url: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: Option<String>,

    #[arg(long, env = "RAG_PDF_LOADER", value_enum, default_value = "lopdf")]
    pub pdf_loader: PdfLoader,

    /// Number of pages retrieved per question
    #[arg(long, env = "RAG_TOP_K", default_value_t = DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Largest accepted request body, in bytes
    #[arg(long, env = "RAG_MAX_UPLOAD_BYTES", default_value_t = 50 * 1024 * 1024)]
    pub max_upload_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_defaults_match_the_documented_layout() {
        let cli = Cli::try_parse_from(["report-rag", "serve"]).unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };

        assert_eq!(args.bind.to_string(), "127.0.0.1:8000");
        assert_eq!(args.persist_dir, PathBuf::from("./chroma"));
        assert_eq!(args.collection, "pdf_collection");
        assert_eq!(args.upload_dir, PathBuf::from("./data/uploaded"));
        assert_eq!(args.top_k, 3);
        assert_eq!(args.chat_model, "gpt-4o");
        assert_eq!(args.embedding_model, "text-embedding-3-large");
        assert_eq!(args.vector_backend, VectorBackend::Local);
        assert_eq!(args.pdf_loader, PdfLoader::Lopdf);
    }

    #[test]
    fn loader_and_backend_are_selectable() {
        let cli = Cli::try_parse_from([
            "report-rag",
            "serve",
            "--pdf-loader",
            "pdf-extract",
            "--vector-backend",
            "qdrant",
            "--embedding-provider",
            "hashing",
        ])
        .unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };

        assert_eq!(LoaderKind::from(args.pdf_loader), LoaderKind::PdfExtract);
        assert_eq!(args.vector_backend, VectorBackend::Qdrant);
        assert_eq!(args.embedding_provider, EmbeddingProvider::Hashing);
    }

    #[test]
    fn ask_takes_the_question_positionally() {
        let cli = Cli::try_parse_from(["report-rag", "ask", "What was revenue?"]).unwrap();
        let Command::Ask { question, .. } = cli.command else {
            panic!("expected ask");
        };
        assert_eq!(question, "What was revenue?");
    }
}
