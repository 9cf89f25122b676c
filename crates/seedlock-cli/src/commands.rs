//! Command implementations for the seedlock binary

use anyhow::{bail, Context as _, Result};
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

use seedlock_codec::{generate_mnemonic, parse_mnemonic, BackupVersion};
use seedlock_core::{Chain, SeedlockError};
use seedlock_store::keychain::names;
use seedlock_store::{BackupStore, PlatformKeychain, SecureBlobStore, SeedStore};

pub struct Context {
    pub data_dir: PathBuf,
    pub chain: Chain,
}

impl Context {
    fn seed_store(&self) -> SeedStore {
        SeedStore::new(&self.data_dir)
    }

    fn backup_store(&self) -> BackupStore {
        BackupStore::new(self.data_dir.join("backups"), self.chain)
    }
}

pub fn cmd_init(ctx: &Context, no_pin: bool, keychain: bool) -> Result<()> {
    let store = ctx.seed_store();
    if store.is_provisioned() {
        bail!(
            "a wallet already exists in {} — run `seedlock reset --force` first",
            ctx.data_dir.display()
        );
    }

    let words = generate_mnemonic()?;

    let pin = if no_pin { None } else { Some(obtain_new_pin()?) };
    store
        .write_seed(words.as_bytes(), pin.as_ref())
        .context("writing seed")?;

    println!("Your recovery phrase (write it down, it will not be shown again):");
    println!();
    println!("    {}", *words);
    println!();
    if no_pin {
        println!("WARNING: the seed is stored UNENCRYPTED. Set a PIN with `seedlock change-pin`.");
    }

    if keychain {
        if let Some(pin) = &pin {
            PlatformKeychain::new().put(names::PIN, pin.expose_secret().as_bytes())?;
            println!("PIN cached in the platform keychain.");
        }
    }

    Ok(())
}

pub fn cmd_restore(ctx: &Context, no_pin: bool) -> Result<()> {
    let store = ctx.seed_store();
    if store.is_provisioned() {
        bail!(
            "a wallet already exists in {} — run `seedlock reset --force` first",
            ctx.data_dir.display()
        );
    }

    let input = rpassword::prompt_password("Enter your recovery phrase: ")
        .context("reading recovery phrase")?;
    let words = parse_mnemonic(&input)?;

    let pin = if no_pin { None } else { Some(obtain_new_pin()?) };
    store
        .write_seed(words.as_bytes(), pin.as_ref())
        .context("writing seed")?;

    println!("Wallet restored into {}", ctx.data_dir.display());
    if no_pin {
        println!("WARNING: the seed is stored UNENCRYPTED. Set a PIN with `seedlock change-pin`.");
    }
    Ok(())
}

pub fn cmd_status(ctx: &Context) -> Result<()> {
    let store = ctx.seed_store();

    println!("data dir:    {}", ctx.data_dir.display());
    println!("chain:       {}", ctx.chain);

    if !store.is_provisioned() {
        println!("seed:        not provisioned (run `seedlock init`)");
        return Ok(());
    }

    let state = store.security_state()?;
    println!("seed:        provisioned");
    if state.seed_encrypted {
        println!("protection:  PIN-encrypted");
    } else {
        println!("protection:  *** NOT ENCRYPTED ***");
        println!();
        println!("WARNING: anyone with access to this device can read the seed.");
        println!("Set a PIN with `seedlock change-pin`.");
    }
    Ok(())
}

pub fn cmd_show(ctx: &Context, keychain: bool) -> Result<()> {
    let words = unlock_seed(ctx, keychain)?;

    println!("Your recovery phrase:");
    println!();
    println!("    {}", String::from_utf8_lossy(&words));
    Ok(())
}

pub fn cmd_change_pin(ctx: &Context, keychain: bool) -> Result<()> {
    let store = ctx.seed_store();
    let words = unlock_seed(ctx, keychain)?;

    let new_pin = obtain_new_pin()?;
    store
        .write_seed(&words, Some(&new_pin))
        .context("re-encrypting seed")?;

    if keychain {
        PlatformKeychain::new().put(names::PIN, new_pin.expose_secret().as_bytes())?;
    }

    println!("Seed re-encrypted under the new PIN.");
    Ok(())
}

pub fn cmd_backup_create(ctx: &Context, payload: &Path, name: &str) -> Result<()> {
    let seed = unlock_seed(ctx, false)?;
    let data = std::fs::read(payload)
        .with_context(|| format!("reading payload {}", payload.display()))?;

    let path = ctx
        .backup_store()
        .write(name, &data, &seed, BackupVersion::V2)
        .context("writing backup")?;

    println!("Backup written to {}", path.display());
    Ok(())
}

pub fn cmd_backup_restore(ctx: &Context, name: &str, out: &Path) -> Result<()> {
    let seed = unlock_seed(ctx, false)?;

    let data = match ctx.backup_store().read(name, &seed) {
        Err(SeedlockError::NotYetProvisioned) => bail!("no backup named '{name}' found"),
        other => other.context("reading backup")?,
    };

    std::fs::write(out, &data).with_context(|| format!("writing {}", out.display()))?;
    println!("Backup restored to {}", out.display());
    Ok(())
}

pub fn cmd_reset(ctx: &Context, force: bool) -> Result<()> {
    if !force {
        bail!("reset is irreversible; pass --force to confirm");
    }

    ctx.seed_store().reset().context("resetting wallet")?;
    // Best effort: a stale cached PIN is useless without the seed
    let _ = PlatformKeychain::new().delete(names::PIN);

    println!("Wallet reset: seed removed from {}", ctx.data_dir.display());
    Ok(())
}

/// Read the seed, prompting for the PIN when the security state says the
/// record is encrypted.
fn unlock_seed(ctx: &Context, try_keychain: bool) -> Result<Zeroizing<Vec<u8>>> {
    let store = ctx.seed_store();
    let state = store.security_state()?;

    let pin = if state.seed_encrypted {
        Some(obtain_pin("Enter your PIN: ", try_keychain)?)
    } else {
        None
    };

    match store.read_seed(pin.as_ref()) {
        Err(SeedlockError::NotYetProvisioned) => {
            bail!("no wallet found in {} — run `seedlock init`", ctx.data_dir.display())
        }
        Err(SeedlockError::AuthenticationFailure) => {
            bail!("wrong PIN")
        }
        other => other.context("reading seed"),
    }
}

/// PIN for unlocking: keychain (opt-in) → SEEDLOCK_PIN env var → prompt.
fn obtain_pin(prompt: &str, try_keychain: bool) -> Result<SecretString> {
    if try_keychain {
        if let Some(blob) = PlatformKeychain::new().get(names::PIN)? {
            let pin = String::from_utf8(blob).context("cached PIN is not valid UTF-8")?;
            return Ok(SecretString::from(pin));
        }
    }
    if let Ok(pin) = std::env::var("SEEDLOCK_PIN") {
        return Ok(SecretString::from(pin));
    }
    let pin = rpassword::prompt_password(prompt).context("reading PIN")?;
    Ok(SecretString::from(pin))
}

/// PIN for provisioning: prompted twice and cross-checked.
fn obtain_new_pin() -> Result<SecretString> {
    if let Ok(pin) = std::env::var("SEEDLOCK_PIN") {
        return Ok(SecretString::from(pin));
    }
    let first = rpassword::prompt_password("Choose a PIN: ").context("reading PIN")?;
    if first.is_empty() {
        bail!("PIN must not be empty (use --no-pin for unencrypted storage)");
    }
    let second = rpassword::prompt_password("Confirm PIN: ").context("reading PIN")?;
    if first != second {
        bail!("PINs do not match");
    }
    Ok(SecretString::from(first))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Command flows that do not require a terminal: the PIN comes from the
    // SEEDLOCK_PIN env var, as in non-interactive use.
    //
    // Env vars are process-global, so these tests share one PIN value, set
    // exactly once rather than racing concurrent set_var calls.
    const TEST_PIN: &str = "123456";
    static PIN_ENV: std::sync::Once = std::sync::Once::new();

    fn test_ctx() -> (tempfile::TempDir, Context) {
        PIN_ENV.call_once(|| std::env::set_var("SEEDLOCK_PIN", TEST_PIN));
        let dir = tempfile::tempdir().unwrap();
        let ctx = Context {
            data_dir: dir.path().to_path_buf(),
            chain: Chain::Testnet,
        };
        (dir, ctx)
    }

    #[test]
    fn test_init_then_unlock() {
        let (_dir, ctx) = test_ctx();

        cmd_init(&ctx, false, false).unwrap();

        let words = unlock_seed(&ctx, false).unwrap();
        parse_mnemonic(std::str::from_utf8(&words).unwrap()).unwrap();
    }

    #[test]
    fn test_init_refuses_existing_wallet() {
        let (_dir, ctx) = test_ctx();

        cmd_init(&ctx, false, false).unwrap();
        assert!(cmd_init(&ctx, false, false).is_err());
    }

    #[test]
    fn test_init_no_pin_stores_plaintext() {
        let (_dir, ctx) = test_ctx();

        cmd_init(&ctx, true, false).unwrap();

        let store = ctx.seed_store();
        assert!(!store.security_state().unwrap().seed_encrypted);
        let words = unlock_seed(&ctx, false).unwrap();
        parse_mnemonic(std::str::from_utf8(&words).unwrap()).unwrap();
    }

    #[test]
    fn test_backup_roundtrip_through_commands() {
        let (dir, ctx) = test_ctx();

        cmd_init(&ctx, false, false).unwrap();

        let payload = dir.path().join("payload.db");
        std::fs::write(&payload, b"channel database bytes").unwrap();

        cmd_backup_create(&ctx, &payload, "channels.bak").unwrap();

        let out = dir.path().join("restored.db");
        cmd_backup_restore(&ctx, "channels.bak", &out).unwrap();

        assert_eq!(std::fs::read(&out).unwrap(), b"channel database bytes");
    }

    #[test]
    fn test_reset_requires_force() {
        let (_dir, ctx) = test_ctx();

        cmd_init(&ctx, false, false).unwrap();
        assert!(cmd_reset(&ctx, false).is_err());
        cmd_reset(&ctx, true).unwrap();
        assert!(!ctx.seed_store().is_provisioned());
    }
}
