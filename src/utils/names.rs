// src/utils/names.rs

/// Strips the final extension from an uploaded filename.
/// `"Log.txt"` -> `"Log"`, `"archive.tar.gz"` -> `"archive.tar"`,
/// dotfiles like `".env"` are kept whole.
pub fn strip_extension(filename: &str) -> &str {
    match filename.rsplit_once('.') {
        Some((base, _)) if !base.is_empty() => base,
        _ => filename,
    }
}

/// Derives a collision-free display name for a quiz.
///
/// Probes `base`, `base 2`, `base 3`, ... against the supplied lookup until a
/// free candidate is found. Purely a name allocator: the probe is best-effort
/// and the database unique constraint is the authority at commit time, so the
/// caller must be prepared to re-probe on a `NameConflict`.
pub fn dedupe_name(filename: &str, mut exists: impl FnMut(&str) -> bool) -> String {
    let base = strip_extension(filename);

    let mut name = base.to_string();
    let mut counter = 2;
    while exists(&name) {
        name = format!("{} {}", base, counter);
        counter += 1;
    }
    name
}
