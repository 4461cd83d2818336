//! In-memory vault for tests. Records every call in order.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::VaultClient;
use crate::error::{Result, VaultError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Exists(String),
    Read(String),
    Write(String, Vec<u8>),
    Delete(String),
    List(String),
}

#[derive(Default)]
pub struct MemoryVault {
    pub files: Mutex<BTreeMap<String, Vec<u8>>>,
    pub calls: Mutex<Vec<Call>>,
    fail_on: Mutex<Option<(&'static str, String)>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let vault = Self::new();
        {
            let mut map = vault.files.lock().unwrap();
            for (path, content) in files {
                map.insert(path.to_string(), content.as_bytes().to_vec());
            }
        }
        vault
    }

    /// Make the named operation ("exists", "read", "write", "delete", "list") fail.
    pub fn fail_on(&self, op: &'static str, message: &str) {
        *self.fail_on.lock().unwrap() = Some((op, message.to_string()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    pub fn content(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    fn check(&self, op: &str) -> Result<()> {
        match &*self.fail_on.lock().unwrap() {
            Some((failing, message)) if *failing == op => Err(VaultError::Api {
                status: 500,
                message: message.clone(),
            }),
            _ => Ok(()),
        }
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl VaultClient for MemoryVault {
    async fn file_exists(&self, path: &str) -> Result<bool> {
        self.record(Call::Exists(path.to_string()));
        self.check("exists")?;
        Ok(self.contains(path))
    }

    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        self.record(Call::Read(path.to_string()));
        self.check("read")?;
        self.content(path)
            .ok_or_else(|| VaultError::NotFound(path.to_string()))
    }

    async fn write_file(&self, path: &str, content: &[u8]) -> Result<()> {
        self.record(Call::Write(path.to_string(), content.to_vec()));
        self.check("write")?;
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), content.to_vec());
        Ok(())
    }

    async fn delete_file(&self, path: &str) -> Result<()> {
        self.record(Call::Delete(path.to_string()));
        self.check("delete")?;
        self.files
            .lock()
            .unwrap()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| VaultError::NotFound(path.to_string()))
    }

    async fn list_dir(&self, dir: &str) -> Result<Vec<String>> {
        self.record(Call::List(dir.to_string()));
        self.check("list")?;
        let files = self.files.lock().unwrap();
        let mut entries: Vec<String> = Vec::new();
        for path in files.keys() {
            let Some(rest) = path.strip_prefix(dir) else {
                continue;
            };
            let entry = match rest.find('/') {
                Some(idx) => rest[..=idx].to_string(),
                None => rest.to_string(),
            };
            if !entries.contains(&entry) {
                entries.push(entry);
            }
        }
        if entries.is_empty() && !dir.is_empty() {
            return Err(VaultError::NotFound(dir.to_string()));
        }
        Ok(entries)
    }
}
