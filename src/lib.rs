pub mod application;
pub mod cli;
pub mod connector;
pub mod domain;

pub use cli::Commands;

pub use application::{
    BatchChatUseCase, ClientFactory, ClientSettings, Clock, CompletionRequest, InferenceBackend,
    InferenceClient, ManageScenariosUseCase, ScenarioPolicy, ScenarioRepository, SessionHandle,
    SessionLimits, SessionStore,
};

pub use connector::{
    Container, ContainerConfig, InMemoryScenarioRepository, ManualClock, MockBackend,
    OllamaBackend, OllamaConfig, Router, SystemClock,
};

pub use domain::{
    builtin_scenarios, BatchItem, BatchReport, ChatMessage, ChatOptions, ChatReply,
    ConversationHistory, DomainError, HistoryWindow, Role, Scenario, ScenarioSummary, Session,
    DEFAULT_SCENARIO, DEFAULT_TEMPERATURE,
};
