use crate::TypeDesc;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("unrecognized key-extraction descriptor shape: `{selector}` on {record}")]
    UnrecognizedSelectorShape { record: TypeDesc, selector: String },
    #[error(
        "selector count exceeds maximum supported composite arity: got {count}, supported 1..={max}"
    )]
    ArityExceeded { count: usize, max: usize },
    #[error(
        "key selectors have unrelated record types; one must be convertible to the other: {left} vs {right}"
    )]
    IncompatibleRecordTypes { left: TypeDesc, right: TypeDesc },
    #[error("composite key resolves to record type {resolved}, not {requested}")]
    RecordTypeMismatch {
        resolved: TypeDesc,
        requested: TypeDesc,
    },
}
