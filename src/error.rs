use thiserror::Error;

/// 转换过程中统一的错误类型。
#[derive(Debug, Error)]
pub enum ClampError {
    #[error("解析失败: {message} (位置 {position})")]
    ParseError { message: String, position: usize },
    #[error("退化的断点区间: {0}")]
    DegenerateRange(String),
    #[error("无法归一化的值: {0}")]
    UnsupportedValue(String),
    #[error("读取文件失败: {0}")]
    Io(String),
}

pub type ClampResult<T> = Result<T, ClampError>;

impl ClampError {
    pub fn parse<S: Into<String>>(message: S, position: usize) -> Self {
        ClampError::ParseError {
            message: message.into(),
            position,
        }
    }
}
