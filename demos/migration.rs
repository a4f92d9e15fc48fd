//! 哈希迁移示例
//!
//! 展示如何在用户登录时把旧系统中的 `{SSHA}` 与 SHA-256 crypt 哈希
//! 透明地升级为 PBKDF2-SHA256。
//!
//! 运行: cargo run --example migration

use std::collections::HashMap;

use passlib::{CryptContext, Outcome, Policy, PolicyConfig, SchemeId};

/// 简单的用户存储（实际应用中应使用数据库）
struct UserStore {
    hashes: HashMap<String, String>,
}

impl UserStore {
    fn new() -> Self {
        Self {
            hashes: HashMap::new(),
        }
    }

    fn insert(&mut self, username: &str, hash: String) {
        self.hashes.insert(username.to_string(), hash);
    }

    fn get(&self, username: &str) -> Option<&str> {
        self.hashes.get(username).map(String::as_str)
    }
}

/// 登录服务
struct LoginService {
    store: UserStore,
    context: CryptContext,
}

impl LoginService {
    fn new(store: UserStore) -> Result<Self, String> {
        let policy = Policy::new(
            PolicyConfig::new([
                SchemeId::PBKDF2_SHA256,
                SchemeId::SHA256_CRYPT,
                SchemeId::LDAP_SALTED_SHA1,
            ])
            .with_auto_deprecation()
            .with_min_rounds(SchemeId::PBKDF2_SHA256, 20_000),
        )
        .map_err(|e| format!("策略配置错误: {}", e))?;

        let context =
            CryptContext::with_builtin_schemes(policy).map_err(|e| format!("上下文创建失败: {}", e))?;
        Ok(Self { store, context })
    }

    /// 用户登录，必要时升级存储的哈希
    fn login(&mut self, username: &str, password: &str) -> Result<(), String> {
        let Some(stored) = self.store.get(username) else {
            // 用户不存在时也执行一次校验，避免通过耗时区分
            self.context.dummy_verify(password.as_bytes());
            return Err("用户名或密码错误".to_string());
        };

        let scheme = self
            .context
            .identify_scheme(stored)
            .map(|id| id.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let result = self.context.verify(password.as_bytes(), stored);
        match result.outcome {
            Outcome::Valid => {}
            Outcome::Invalid => return Err("用户名或密码错误".to_string()),
            Outcome::Malformed => return Err(format!("{} 的存储哈希已损坏", username)),
        }

        println!("✅ {} 登录成功 (scheme: {})", username, scheme);
        if let Some(replacement) = result.replacement {
            println!("   ↻ 哈希已升级为 {}", self.context.policy().default_scheme());
            self.store.insert(username, replacement);
        }
        Ok(())
    }
}

fn main() {
    println!("=== passlib 哈希迁移示例 ===\n");

    // 1. 旧系统中遗留的哈希
    let mut store = UserStore::new();
    store.insert("alice", "{SSHA}ouUZQtFbhkQrfIJ43qx176Wfj4YBAgME".to_string());
    store.insert(
        "bob",
        "$5$saltstring$5B8vYYiY.CVt1RlTTf8KbXBH3hsxY/GNooZaBBGWEc5".to_string(),
    );
    store.insert("carol", "$5$broken".to_string());

    let mut service = match LoginService::new(store) {
        Ok(service) => service,
        Err(e) => {
            eprintln!("❌ {}", e);
            return;
        }
    };

    // 2. 第一次登录：校验旧哈希并升级
    println!("--- 第一次登录 ---");
    for (username, password) in [
        ("alice", "password"),
        ("bob", "Hello world!"),
        ("bob", "wrong password"),
        ("carol", "anything"),
        ("dave", "anything"),
    ] {
        if let Err(e) = service.login(username, password) {
            println!("❌ {}: {}", username, e);
        }
    }

    // 3. 第二次登录：哈希已经是当前默认 scheme，不再升级
    println!("\n--- 第二次登录 ---");
    for (username, password) in [("alice", "password"), ("bob", "Hello world!")] {
        if let Err(e) = service.login(username, password) {
            println!("❌ {}: {}", username, e);
        }
    }

    // 4. 升级后的存储状态
    println!("\n--- 存储状态 ---");
    for username in ["alice", "bob", "carol"] {
        if let Some(hash) = service.store.get(username) {
            let needs_update = service.context.needs_update(hash);
            println!("{}: needs_update = {}", username, needs_update);
        }
    }
}
