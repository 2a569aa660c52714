//! # ユースケース層
//!
//! 通知の組み立てと送信を担当する。ハンドラはこの層のサービスを呼び出すだけにする。

pub mod notification;
