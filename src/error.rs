use thiserror::Error;

/// 索引操作的错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    /// 记录缺少必要字段，或字段类型、签名维度不正确
    #[error("无效的记录: {reason}")]
    InvalidRecord { reason: String },

    /// 构建索引时传入了无效的参数
    #[error("无效的配置: {reason}")]
    InvalidConfig { reason: String },
}

impl IndexError {
    pub fn invalid_record(reason: impl Into<String>) -> Self {
        Self::InvalidRecord { reason: reason.into() }
    }

    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig { reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, IndexError>;
