//! 저장소 구현.
//!
//! 메모리 저장소는 `sigbot_core`에 있고, 여기에는 DB 구현만 둡니다.

pub mod preferences;

pub use preferences::PgPreferenceRepository;
