#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod progress_service;
pub mod study_timer;
pub mod view;

pub use revise_core::Clock;

pub use app_services::AppServices;
pub use error::AppServicesError;
pub use progress_service::ProgressService;
pub use study_timer::ChapterTimer;
pub use view::SubjectOverview;
