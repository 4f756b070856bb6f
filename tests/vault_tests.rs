//! Integration tests for the credvault vault module.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use credvault::crypto::{decrypt, derive_key, encrypt, Argon2Params};
use credvault::errors::VaultError;
use credvault::vault::{
    CredentialRecord, OpenStatus, SkipReason, Vault, VaultFormat, VaultOptions, BACKUP_SUFFIX,
    REPAIR_BACKUP_SUFFIX,
};
use tempfile::TempDir;

/// Helper: create a temporary vault file path inside a fresh temp dir.
fn vault_path() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("test.vault");
    (dir, path)
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

fn mail() -> CredentialRecord {
    CredentialRecord::new(
        "Mail",
        Some("a@b.com".into()),
        "x1!",
        Some("mail.example.com".into()),
    )
}

/// Hardened options with a cheap Argon2 cost.
fn hardened() -> VaultOptions {
    VaultOptions {
        format: VaultFormat::Hardened,
        argon2: Argon2Params {
            memory_kib: 8_192,
            iterations: 1,
            parallelism: 1,
        },
    }
}

/// Write `plaintext` as a legacy vault file, bypassing the codec.
fn write_legacy(path: &Path, passphrase: &str, plaintext: &str) {
    let blob = encrypt(&derive_key(passphrase), plaintext.as_bytes()).unwrap();
    fs::write(path, BASE64.encode(blob)).unwrap();
}

/// Decrypt a legacy vault file back to its record text.
fn read_legacy(path: &Path, passphrase: &str) -> String {
    let blob = BASE64.decode(fs::read_to_string(path).unwrap().trim()).unwrap();
    String::from_utf8(decrypt(&derive_key(passphrase), &blob).unwrap()).unwrap()
}

fn titles(vault: &Vault) -> Vec<String> {
    vault.records().iter().map(|r| r.title.clone()).collect()
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn create_add_and_reopen() {
    let (_dir, path) = vault_path();

    let mut vault = Vault::new();
    vault.create(&path, "pw1").expect("create vault");
    assert!(vault.is_open());
    assert_eq!(vault.current_name().as_deref(), Some("test.vault"));
    assert_eq!(vault.format(), Some(VaultFormat::Legacy));

    vault.add_record(mail()).unwrap();
    vault
        .add_record(CredentialRecord::new("Bank", None, "p|a\\ss\nword", None))
        .unwrap();
    let saved: Vec<CredentialRecord> = vault.records().to_vec();
    vault.close();
    assert!(!vault.is_open());
    assert_eq!(vault.count(), 0);

    let mut reopened = Vault::new();
    let status = reopened.open(&path, "pw1").expect("open vault");
    assert!(matches!(status, OpenStatus::Loaded { records: 2, .. }));
    assert!(status.skipped().is_empty());
    assert_eq!(reopened.records(), &saved[..]);
}

#[test]
fn mail_scenario() {
    let (_dir, path) = vault_path();

    let mut vault = Vault::new();
    vault.create(&path, "pw").unwrap();
    vault.add_record(mail()).unwrap();

    let mut vault = Vault::new();
    vault.open(&path, "pw").unwrap();
    let hits = vault.search("mail");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].username.as_deref(), Some("a@b.com"));
    assert_eq!(hits[0].secret, "x1!");
    assert!(vault.search("nomatch").is_empty());

    vault.remove_record(0).unwrap();
    let mut vault = Vault::new();
    vault.open(&path, "pw").unwrap();
    assert_eq!(vault.count(), 0);
}

#[test]
fn file_is_single_radix64_line() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::new();
    vault.create(&path, "pw").unwrap();
    vault.add_record(mail()).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    assert!(!text.contains('\n'));
    assert!(!text.contains("Mail"));
    assert!(BASE64.decode(&text).is_ok());
}

#[test]
fn wrong_passphrase_does_not_return_records() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::new();
    vault.create(&path, "right").unwrap();
    vault.add_record(mail()).unwrap();
    vault.close();

    let status = vault.open(&path, "wrong").unwrap();
    match status {
        OpenStatus::Recovered { .. } => assert_eq!(vault.count(), 0),
        other => {
            assert!(vault.search("mail").is_empty(), "unexpected {other:?}");
        }
    }
}

#[test]
fn create_overwrites_existing_file() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::new();
    vault.create(&path, "pw").unwrap();
    vault.add_record(mail()).unwrap();

    vault.create(&path, "pw").unwrap();
    assert_eq!(vault.count(), 0);

    let mut reopened = Vault::new();
    reopened.open(&path, "pw").unwrap();
    assert_eq!(reopened.count(), 0);
}

#[test]
fn open_missing_file_is_not_found() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::new();
    assert!(matches!(
        vault.open(&path, "pw"),
        Err(VaultError::NotFound(p)) if p == path
    ));
    assert!(!vault.is_open());
    assert!(!sibling(&path, BACKUP_SUFFIX).exists());
}

#[test]
fn empty_file_opens_as_empty_vault() {
    let (_dir, path) = vault_path();
    fs::write(&path, "  \n\t\n").unwrap();

    let mut vault = Vault::new();
    assert!(matches!(vault.open(&path, "pw").unwrap(), OpenStatus::Empty));
    assert!(vault.is_open());

    vault.add_record(mail()).unwrap();
    let mut reopened = Vault::new();
    reopened.open(&path, "pw").unwrap();
    assert_eq!(titles(&reopened), ["Mail"]);
}

#[test]
fn whitespace_and_line_breaks_in_file_are_ignored() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::new();
    vault.create(&path, "pw").unwrap();
    vault.add_record(mail()).unwrap();

    let text = fs::read_to_string(&path).unwrap();
    let wrapped: String = text
        .as_bytes()
        .chunks(10)
        .map(|c| format!("{}\r\n", std::str::from_utf8(c).unwrap()))
        .collect();
    fs::write(&path, format!("  {wrapped}\n")).unwrap();

    let mut reopened = Vault::new();
    assert!(matches!(
        reopened.open(&path, "pw").unwrap(),
        OpenStatus::Loaded { records: 1, .. }
    ));
}

#[test]
fn save_requires_open_vault() {
    let vault = Vault::new();
    assert!(matches!(vault.save(), Err(VaultError::State(_))));

    let mut vault = Vault::new();
    assert!(matches!(vault.add_record(mail()), Err(VaultError::State(_))));
}

#[test]
fn closed_vault_rejects_record_access() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::new();
    assert!(matches!(vault.record(0), Err(VaultError::State(_))));

    vault.create(&path, "pw").unwrap();
    vault.add_record(mail()).unwrap();
    vault.close();
    assert!(matches!(vault.record(0), Err(VaultError::State(_))));
    assert!(matches!(
        vault.update_record(0, mail()),
        Err(VaultError::State(_))
    ));
    assert!(matches!(vault.remove_record(0), Err(VaultError::State(_))));
}

#[test]
fn close_is_idempotent() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::new();
    vault.close();
    vault.create(&path, "pw").unwrap();
    vault.close();
    vault.close();
    assert!(vault.path().is_none());
    assert!(vault.current_name().is_none());
    assert!(vault.format().is_none());
}

// ---------------------------------------------------------------------------
// Record operations
// ---------------------------------------------------------------------------

#[test]
fn invalid_records_are_rejected() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::new();
    vault.create(&path, "pw").unwrap();

    let no_title = CredentialRecord::new(" ", None, "x", None);
    let no_secret = CredentialRecord::new("Mail", None, "", None);
    assert!(matches!(vault.add_record(no_title), Err(VaultError::InvalidRecord(_))));
    assert!(matches!(vault.add_record(no_secret), Err(VaultError::InvalidRecord(_))));
    assert_eq!(vault.count(), 0);
}

#[test]
fn out_of_range_index_does_not_mutate() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::new();
    vault.create(&path, "pw").unwrap();
    vault.add_record(mail()).unwrap();

    assert!(matches!(
        vault.update_record(1, mail()),
        Err(VaultError::Range { index: 1, len: 1 })
    ));
    assert!(matches!(vault.remove_record(5), Err(VaultError::Range { .. })));
    assert!(matches!(vault.record(1), Err(VaultError::Range { .. })));
    assert_eq!(vault.count(), 1);
}

#[test]
fn update_keeps_created_at_and_persists() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::new();
    vault.create(&path, "pw").unwrap();
    vault.add_record(mail()).unwrap();
    let created = vault.record(0).unwrap().created_at;

    std::thread::sleep(std::time::Duration::from_millis(5));
    let replacement = CredentialRecord::new("Webmail", None, "new-secret", None);
    vault.update_record(0, replacement).unwrap();

    let mut reopened = Vault::new();
    reopened.open(&path, "pw").unwrap();
    let r = reopened.record(0).unwrap();
    assert_eq!(r.title, "Webmail");
    assert_eq!(r.secret, "new-secret");
    assert_eq!(r.username, None);
    assert_eq!(r.created_at, created);
}

#[test]
fn remove_returns_record_and_shifts_indexes() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::new();
    vault.create(&path, "pw").unwrap();
    for title in ["A", "B", "C"] {
        vault
            .add_record(CredentialRecord::new(title, None, "s", None))
            .unwrap();
    }

    let removed = vault.remove_record(1).unwrap();
    assert_eq!(removed.title, "B");
    assert_eq!(titles(&vault), ["A", "C"]);
    assert_eq!(vault.record(1).unwrap().title, "C");
}

#[test]
fn search_is_case_insensitive_and_ordered() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::new();
    vault.create(&path, "pw").unwrap();
    vault
        .add_record(CredentialRecord::new("GitHub", Some("octo".into()), "s", None))
        .unwrap();
    vault.add_record(mail()).unwrap();
    vault
        .add_record(CredentialRecord::new("Work", None, "mail", Some("MAIL.corp".into())))
        .unwrap();

    let hits: Vec<&str> = vault.search("  MAIL ").iter().map(|r| r.title.as_str()).collect();
    assert_eq!(hits, ["Mail", "Work"]);

    let indexed: Vec<usize> = vault.search_indexed("mail").iter().map(|(i, _)| *i).collect();
    assert_eq!(indexed, [1, 2]);

    assert_eq!(vault.search("").len(), 3);
    assert_eq!(vault.search("   ").len(), 3);
    // Secrets are not searched.
    assert!(vault.search("x1!").is_empty());
}

#[test]
fn failed_save_rolls_back() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::new();
    vault.create(&path, "pw").unwrap();
    vault.add_record(mail()).unwrap();

    // A non-empty directory in place of the file makes the final rename fail.
    fs::remove_file(&path).unwrap();
    fs::create_dir(&path).unwrap();
    fs::write(path.join("occupied"), b"x").unwrap();

    let err = vault
        .add_record(CredentialRecord::new("Bank", None, "s", None))
        .unwrap_err();
    assert!(matches!(err, VaultError::Persist { .. }));
    assert_eq!(titles(&vault), ["Mail"]);

    assert!(matches!(vault.remove_record(0), Err(VaultError::Persist { .. })));
    assert_eq!(vault.count(), 1);

    let replacement = CredentialRecord::new("Other", None, "s", None);
    assert!(vault.update_record(0, replacement).is_err());
    assert_eq!(vault.record(0).unwrap().title, "Mail");

    // No temp file left behind.
    let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

// ---------------------------------------------------------------------------
// Recovery and repair
// ---------------------------------------------------------------------------

#[test]
fn corrupt_file_is_backed_up_and_left_untouched() {
    let (_dir, path) = vault_path();
    let garbage = b"\x00\x01~~~ not a vault at all! \xff\xfe".to_vec();
    fs::write(&path, &garbage).unwrap();

    let mut vault = Vault::new();
    let status = vault.open(&path, "pw").unwrap();

    let backup = sibling(&path, BACKUP_SUFFIX);
    match &status {
        OpenStatus::Recovered { backup: b, cause } => {
            assert_eq!(b, &backup);
            assert!(cause.is_recoverable());
        }
        other => panic!("expected recovery, got {other:?}"),
    }
    assert!(vault.is_open());
    assert_eq!(vault.count(), 0);
    assert_eq!(fs::read(&backup).unwrap(), garbage);
    assert_eq!(fs::read(&path).unwrap(), garbage);
}

#[test]
fn existing_backup_is_never_overwritten() {
    let (_dir, path) = vault_path();
    fs::write(&path, "first!!").unwrap();
    Vault::new().open(&path, "pw").unwrap();

    fs::write(&path, "second!!").unwrap();
    let status = Vault::new().open(&path, "pw").unwrap();
    assert!(status.is_recovered());

    assert_eq!(fs::read_to_string(sibling(&path, BACKUP_SUFFIX)).unwrap(), "first!!");
}

#[test]
fn recovered_vault_saves_over_corrupt_file() {
    let (_dir, path) = vault_path();
    fs::write(&path, "@@@@").unwrap();

    let mut vault = Vault::new();
    assert!(vault.open(&path, "pw").unwrap().is_recovered());
    vault.add_record(mail()).unwrap();

    let mut reopened = Vault::new();
    reopened.open(&path, "pw").unwrap();
    assert_eq!(titles(&reopened), ["Mail"]);
}

#[test]
fn bad_padding_character_triggers_recovery() {
    let (_dir, path) = vault_path();
    fs::write(&path, "QU=D").unwrap();

    let mut vault = Vault::new();
    match vault.open(&path, "pw").unwrap() {
        OpenStatus::Recovered { cause, .. } => assert!(matches!(cause, VaultError::Format(_))),
        other => panic!("expected recovery, got {other:?}"),
    }
}

#[test]
fn undecodable_lines_are_reported() {
    let (_dir, path) = vault_path();
    write_legacy(&path, "pw", "A|u|s|site|1\nno pipes here\nB|u|s|site|later\n");

    let mut vault = Vault::new();
    let status = vault.open(&path, "pw").unwrap();
    assert!(matches!(status, OpenStatus::Loaded { records: 1, .. }));

    let skipped = status.skipped();
    assert_eq!(skipped.len(), 2);
    assert_eq!(skipped[0].line, 2);
    assert_eq!(skipped[0].reason, SkipReason::TooFewFields { found: 1 });
    assert_eq!(skipped[1].line, 3);
    assert!(matches!(skipped[1].reason, SkipReason::BadTimestamp(_)));
    assert_eq!(titles(&vault), ["A"]);
}

#[test]
fn records_without_title_or_secret_are_skipped() {
    let (_dir, path) = vault_path();
    write_legacy(&path, "pw", "|u|s|site|1\nA|u|s|site|2\nB|u||site|3\n");

    let mut vault = Vault::new();
    let status = vault.open(&path, "pw").unwrap();
    assert!(matches!(status, OpenStatus::Loaded { records: 1, .. }));
    assert!(status
        .skipped()
        .iter()
        .all(|s| matches!(s.reason, SkipReason::InvalidRecord(_))));
    assert_eq!(titles(&vault), ["A"]);
}

#[test]
fn legacy_backslashes_survive_open_and_save() {
    let (_dir, path) = vault_path();
    let line = "Bank|u|Pa\\ss\\rd|C:\\\\share|1700000000000\n";
    write_legacy(&path, "pw", line);

    let mut vault = Vault::new();
    vault.open(&path, "pw").unwrap();
    let bank = vault.record(0).unwrap();
    assert_eq!(bank.secret, "Pa\\ss\\rd");
    assert_eq!(bank.site.as_deref(), Some("C:\\\\share"));

    vault
        .add_record(CredentialRecord::new("Pipe", None, "a|b", None))
        .unwrap();
    let text = read_legacy(&path, "pw");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(line.trim_end()));
    assert!(lines.next().unwrap().starts_with("Pipe||a\\|b||"));
}

#[test]
fn payload_with_no_decodable_lines_triggers_recovery() {
    let (_dir, path) = vault_path();
    write_legacy(&path, "pw", "garbage\nmore garbage\n");

    let mut vault = Vault::new();
    match vault.open(&path, "pw").unwrap() {
        OpenStatus::Recovered { cause, .. } => {
            assert!(matches!(cause, VaultError::Decryption(_)))
        }
        other => panic!("expected recovery, got {other:?}"),
    }
}

#[test]
fn repair_keeps_a_copy_and_starts_empty() {
    let (_dir, path) = vault_path();
    fs::write(&path, "broken").unwrap();

    let mut vault = Vault::new();
    let backup = vault.repair(&path, "fresh").unwrap();
    let expected = sibling(&path, REPAIR_BACKUP_SUFFIX);
    assert_eq!(backup.as_deref(), Some(expected.as_path()));
    assert_eq!(fs::read_to_string(&expected).unwrap(), "broken");
    assert_eq!(vault.count(), 0);

    // A second repair replaces the earlier copy.
    vault.add_record(mail()).unwrap();
    vault.repair(&path, "fresh").unwrap();
    assert_ne!(fs::read_to_string(&expected).unwrap(), "broken");

    let mut reopened = Vault::new();
    assert!(matches!(
        reopened.open(&path, "fresh").unwrap(),
        OpenStatus::Loaded { records: 0, .. }
    ));
}

#[test]
fn repair_without_existing_file_just_creates() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::new();
    assert_eq!(vault.repair(&path, "pw").unwrap(), None);
    assert!(path.exists());
    assert!(!sibling(&path, REPAIR_BACKUP_SUFFIX).exists());
}

// ---------------------------------------------------------------------------
// Hardened format
// ---------------------------------------------------------------------------

#[test]
fn hardened_roundtrip_keeps_format() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::new();
    vault.create_with(&path, "pw", &hardened()).unwrap();
    assert_eq!(vault.format(), Some(VaultFormat::Hardened));
    vault.add_record(mail()).unwrap();

    let bytes = BASE64.decode(fs::read_to_string(&path).unwrap()).unwrap();
    assert!(bytes.starts_with(b"CVH1"));

    // Default options do not matter: the file header decides.
    let mut reopened = Vault::new();
    let status = reopened.open(&path, "pw").unwrap();
    assert!(matches!(status, OpenStatus::Loaded { records: 1, .. }));
    assert_eq!(reopened.format(), Some(VaultFormat::Hardened));

    reopened.add_record(CredentialRecord::new("Bank", None, "s", None)).unwrap();
    let bytes = BASE64.decode(fs::read_to_string(&path).unwrap()).unwrap();
    assert!(bytes.starts_with(b"CVH1"));
}

#[test]
fn hardened_wrong_passphrase_fails_integrity() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::new();
    vault.create_with(&path, "right", &hardened()).unwrap();
    vault.add_record(mail()).unwrap();

    match Vault::new().open(&path, "wrong").unwrap() {
        OpenStatus::Recovered { cause, .. } => {
            assert!(matches!(cause, VaultError::Integrity(_)))
        }
        other => panic!("expected recovery, got {other:?}"),
    }
}

#[test]
fn hardened_tampering_is_detected_before_decryption() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::new();
    vault.create_with(&path, "pw", &hardened()).unwrap();
    vault.add_record(mail()).unwrap();

    let mut bytes = BASE64.decode(fs::read_to_string(&path).unwrap()).unwrap();
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0x80;
    fs::write(&path, BASE64.encode(&bytes)).unwrap();

    match Vault::new().open(&path, "pw").unwrap() {
        OpenStatus::Recovered { cause, .. } => {
            assert!(matches!(cause, VaultError::Integrity(_)))
        }
        other => panic!("expected recovery, got {other:?}"),
    }
}

#[test]
fn legacy_file_stays_legacy_with_hardened_options() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::new();
    vault.create(&path, "pw").unwrap();
    vault.add_record(mail()).unwrap();

    let mut reopened = Vault::new();
    reopened.open_with(&path, "pw", &hardened()).unwrap();
    assert_eq!(reopened.format(), Some(VaultFormat::Legacy));
}

#[test]
fn legacy_tampering_recovers_or_changes_content() {
    let (_dir, path) = vault_path();
    let mut vault = Vault::new();
    vault.create(&path, "pw").unwrap();
    vault.add_record(mail()).unwrap();
    let original: Vec<CredentialRecord> = vault.records().to_vec();

    let mut bytes = BASE64.decode(fs::read_to_string(&path).unwrap()).unwrap();
    // First ciphertext byte: garbles block one, flips one byte of block two.
    bytes[16] ^= 0x01;
    fs::write(&path, BASE64.encode(&bytes)).unwrap();

    let mut reopened = Vault::new();
    match reopened.open(&path, "pw").unwrap() {
        OpenStatus::Recovered { cause, .. } => assert!(cause.is_recoverable()),
        OpenStatus::Loaded { .. } => assert_ne!(reopened.records(), &original[..]),
        OpenStatus::Empty => panic!("tampered file cannot look empty"),
    }
}
