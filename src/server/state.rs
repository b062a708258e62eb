use std::sync::Arc;

use subtle::ConstantTimeEq;

use crate::index::SignatureIndex;

/// 应用状态
pub struct AppState {
    /// 签名索引
    pub index: SignatureIndex,
    /// 鉴权 token
    pub token: String,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(index: SignatureIndex, token: String) -> Arc<Self> {
        Arc::new(AppState { index, token })
    }

    /// 检查请求携带的 token，按常数时间比较
    pub fn authorize(&self, token: &str) -> bool {
        self.token.as_bytes().ct_eq(token.as_bytes()).into()
    }
}
