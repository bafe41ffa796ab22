use crate::config::Config;
use axum::response::Json;
use serde::Serialize;
use sysinfo::System;

#[derive(Serialize, Debug)]
pub struct SystemInfo {
    pub version: String,
    pub platform: String,
    pub arch: String,
    pub cpus: usize,
    pub cpu_model: String,
    pub memory_total_gb: f64,
    pub memory_free_gb: f64,
    pub memory_used_gb: f64,
}

#[derive(Serialize, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub system: SystemInfo,
}

pub fn get_system_info() -> SystemInfo {
    let mut system = System::new();
    system.refresh_memory();
    system.refresh_cpu();

    let memory_total = system.total_memory() as f64 / 1024.0 / 1024.0 / 1024.0;
    let memory_free = system.available_memory() as f64 / 1024.0 / 1024.0 / 1024.0;

    let cpu_model = system
        .cpus()
        .first()
        .map(|cpu| cpu.brand().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    SystemInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        platform: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
        cpus: system.cpus().len(),
        cpu_model,
        memory_total_gb: memory_total,
        memory_free_gb: memory_free,
        memory_used_gb: (memory_total - memory_free).max(0.0),
    }
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    let system = tokio::task::spawn_blocking(get_system_info)
        .await
        .unwrap_or_else(|_| SystemInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
            platform: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            cpus: 0,
            cpu_model: "unknown".to_string(),
            memory_total_gb: 0.0,
            memory_free_gb: 0.0,
            memory_used_gb: 0.0,
        });

    Json(HealthResponse {
        status: "ok".to_string(),
        system,
    })
}

pub fn print_startup_info(config: &Config) {
    println!("{}", "=".repeat(60));
    println!("🚀 Playlist Backend Starting...");
    println!("{}", "=".repeat(60));

    let sys_info = get_system_info();
    println!("📊 System Information:");
    println!("  Version: {}", sys_info.version);
    println!("  Platform: {} ({})", sys_info.platform, sys_info.arch);
    println!("  CPUs: {} ({})", sys_info.cpus, sys_info.cpu_model);
    println!(
        "  Memory: {:.2} GB total, {:.2} GB free, {:.2} GB used",
        sys_info.memory_total_gb, sys_info.memory_free_gb, sys_info.memory_used_gb
    );
    println!(
        "  Explore page size: {} (max {})",
        config.explore.default_page_size, config.explore.max_page_size
    );
    println!(
        "  Request timeout: {}",
        match config.limits.request_timeout_secs {
            0 => "disabled".to_string(),
            secs => format!("{}s", secs),
        }
    );
    println!("{}", "=".repeat(60));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_this_build() {
        let info = get_system_info();
        assert_eq!(info.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(info.platform, std::env::consts::OS);
        assert!(info.memory_used_gb >= 0.0);
    }
}
