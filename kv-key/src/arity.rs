use crate::KeyError;

/// 组合键支持的最大槽位数
pub const MAX_ARITY: usize = 10;

pub fn check_arity(count: usize) -> Result<(), KeyError> {
    if (1..=MAX_ARITY).contains(&count) {
        return Ok(());
    }
    Err(KeyError::ArityExceeded {
        count,
        max: MAX_ARITY,
    })
}
