use include_dir::{include_dir, Dir};
use std::path::Path;

pub const ENV_INTP_CODE_ROOT: &str = "INTP_CODE_ROOT";

pub(crate) const SESSION_MODULE: &str = "intp_session";
pub(crate) const SESSION_FILE: &str = "intp_session.py";

static CODE: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/pycode/");

/// Looks up helper python source, preferring `$INTP_CODE_ROOT/<path>` over
/// the copy compiled into the crate.
pub(crate) fn get_code(path: &str) -> Option<String> {
    let clean_path = path.trim_start_matches('/');

    std::env::var(ENV_INTP_CODE_ROOT)
        .ok()
        .and_then(|code_root| std::fs::read_to_string(Path::new(&code_root).join(clean_path)).ok())
        .or_else(|| {
            CODE.get_file(clean_path)
                .and_then(|f| f.contents_utf8().map(|s| s.to_string()))
        })
}
