//! Application State - Stato globale dell'applicazione
//!
//! Contiene tutti i repository, la configurazione, il client HTTP per le
//! chiamate in uscita (LLM, Kakao, webhook email), la mappa delle stanze
//! livechat e il vector store del chatbot.

use std::path::PathBuf;
use std::sync::Arc;

use sqlx::MySqlPool;
use tokio::sync::OnceCell;

use crate::chatbot::{ChatbotError, VectorStore};
use crate::core::config::Config;
use crate::repositories::{
    ChatMessageRepository, ChatRoomRepository, CommentRepository, EmailRepository,
    ImageRepository, PostRepository, QuestionRepository, RecipeRepository, ReportRepository,
    UserRepository,
};
use crate::ws::roommap::RoomMap;

/// Stato globale dell'applicazione condiviso tra tutte le route e middleware
pub struct AppState {
    /// Repository per la gestione degli utenti
    pub user: UserRepository,

    /// Repository per i post della community
    pub post: PostRepository,

    /// Repository per i commenti
    pub comment: CommentRepository,

    /// Repository per le segnalazioni
    pub report: ReportRepository,

    /// Repository per le immagini caricate
    pub image: ImageRepository,

    /// Repository per le stanze livechat
    pub room: ChatRoomRepository,

    /// Repository per i messaggi livechat
    pub msg: ChatMessageRepository,

    /// Repository per i CSV di ricette
    pub recipe: RecipeRepository,

    /// Repository per le domande al chatbot
    pub question: QuestionRepository,

    /// Repository per token di verifica ed email amministrative
    pub email: EmailRepository,

    /// Secret key per JWT token
    pub jwt_secret: String,

    /// Configurazione completa (media, LLM, kakao, webhook email)
    pub config: Config,

    /// Client HTTP riusato per tutte le chiamate in uscita
    pub http_client: reqwest::Client,

    /// Mappa concorrente delle stanze livechat con almeno un utente connesso
    pub rooms_online: RoomMap,

    /// Vector store del chatbot, inizializzato pigramente al primo uso
    vector_store: OnceCell<Arc<VectorStore>>,
}

impl AppState {
    /// Crea una nuova istanza di AppState inizializzando tutti i repository
    /// con il pool di connessioni fornito.
    pub fn new(pool: MySqlPool, config: Config) -> Self {
        Self {
            user: UserRepository::new(pool.clone()),
            post: PostRepository::new(pool.clone()),
            comment: CommentRepository::new(pool.clone()),
            report: ReportRepository::new(pool.clone()),
            image: ImageRepository::new(pool.clone()),
            room: ChatRoomRepository::new(pool.clone()),
            msg: ChatMessageRepository::new(pool.clone()),
            recipe: RecipeRepository::new(pool.clone()),
            question: QuestionRepository::new(pool.clone()),
            email: EmailRepository::new(pool),
            jwt_secret: config.jwt_secret.clone(),
            http_client: reqwest::Client::builder()
                .connect_timeout(std::time::Duration::from_secs(10))
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("failed to build HTTP client"),
            rooms_online: RoomMap::new(),
            vector_store: OnceCell::new(),
            config,
        }
    }

    /// Accesso al vector store con inizializzazione pigra: il primo
    /// chiamante ricarica le entry persistite, i successivi riusano
    /// l'istanza condivisa (OnceCell fa da double-checked lock).
    pub async fn vector_store(&self) -> Result<&Arc<VectorStore>, ChatbotError> {
        self.vector_store
            .get_or_try_init(|| async {
                let path = PathBuf::from(&self.config.vector_store_path);
                VectorStore::open_or_create(&path).map(Arc::new)
            })
            .await
    }
}
