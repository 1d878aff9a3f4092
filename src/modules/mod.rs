//! Daily Blog 模块组织结构
//!
//! 核心配置、错误和命令行
pub mod config;
pub mod cli;
pub mod error;

// 数据库相关模块
pub mod database {
    pub mod storage;
    pub mod credentials;
    pub mod users;
    pub mod posts;
    pub mod comments;
}

// 内容处理相关模块
pub mod content {
    pub mod markdown;
    pub mod templates;
}

// Web 相关模块
pub mod web {
    pub mod auth;
    pub mod admin;
    pub mod routes;
    pub mod state;
}
