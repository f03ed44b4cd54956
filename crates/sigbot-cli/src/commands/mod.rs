//! CLI 명령 구현.

pub mod inspect;
pub mod matching;
pub mod migrate;
