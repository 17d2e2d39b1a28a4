use crate::{Convertibility, KeyError, MAX_ARITY, TypeDesc};

/// 按声明顺序左折叠，求出所有描述符都能接受的公共记录类型
///
/// 只尝试声明顺序：换一种顺序能够解析、但声明顺序不能的组合同样会失败。
pub fn resolve_common_record<V>(records: &[TypeDesc], conv: &V) -> Result<TypeDesc, KeyError>
where
    V: Convertibility + ?Sized,
{
    let Some((&first, rest)) = records.split_first() else {
        return Err(KeyError::ArityExceeded {
            count: 0,
            max: MAX_ARITY,
        });
    };

    let mut common = first;
    for &next in rest {
        if next == common {
            continue;
        }
        let forward = conv.is_convertible(common, next);
        let backward = conv.is_convertible(next, common);
        common = match (forward, backward) {
            (true, false) => next,
            (_, true) => common,
            (false, false) => {
                return Err(KeyError::IncompatibleRecordTypes {
                    left: common,
                    right: next,
                });
            }
        };
        log::trace!("resolved {next} against accumulator, now {common}");
    }

    log::debug!("common record type of {} selectors: {common}", records.len());
    Ok(common)
}
