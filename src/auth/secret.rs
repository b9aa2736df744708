use anyhow::Context;
use std::path::Path;

const SECRET_FILE: &str = "session_secret.key";

/// Session signing secret: from config if set, else from `<data_dir>/session_secret.key`,
/// else freshly generated and persisted there.
pub fn load_or_create(configured: Option<&str>, data_dir: &Path) -> anyhow::Result<String> {
    if let Some(secret) = configured.filter(|s| !s.is_empty()) {
        return Ok(secret.to_string());
    }

    let secret_path = data_dir.join(SECRET_FILE);
    if secret_path.exists() {
        let secret = std::fs::read_to_string(&secret_path)
            .with_context(|| format!("failed to read {}", secret_path.display()))?
            .trim()
            .to_string();
        if secret.is_empty() {
            anyhow::bail!("{} is empty", secret_path.display());
        }
        return Ok(secret);
    }

    tracing::info!(
        "Generating new session secret (persisting to {:?})",
        secret_path
    );
    let mut secret_bytes = [0u8; 32];
    rand::RngExt::fill(&mut rand::rng(), &mut secret_bytes);
    let secret = hex::encode(secret_bytes);
    std::fs::create_dir_all(data_dir).context("failed to create data directory")?;
    std::fs::write(&secret_path, &secret)
        .with_context(|| format!("failed to write {}", secret_path.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&secret_path, std::fs::Permissions::from_mode(0o600))?;
    }
    Ok(secret)
}
