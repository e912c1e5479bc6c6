//! Check command implementation.
//!
//! Validates runtime requirements and configuration.

use pg_meminfo::config::{validate_effective_config, Config};
use pg_meminfo::process::ProcessEnumerator;
use pg_meminfo::query::{connect_options, PgActivityService};
use pg_meminfo::startup_checks::{check_proc_access, check_user_privileges};
use pg_meminfo::reader_for;

/// Validates runtime requirements and configuration.
pub fn command_check(
    proc: bool,
    memory: bool,
    database: bool,
    all: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 pg-meminfo - System Check");
    println!("============================");

    let mut all_ok = true;
    let proc_root = config.proc_root();

    println!("\n👤 Checking privileges...");
    if check_user_privileges() {
        println!("   ✅ Running as root");
    } else {
        println!("   ⚠️  Not running as root - other users' processes may be skipped");
    }

    // Check /proc filesystem
    if proc || all {
        println!("\n📁 Checking {}...", proc_root.display());
        match check_proc_access(&proc_root) {
            Ok(()) => {
                println!("   ✅ {} accessible", proc_root.display());
                match ProcessEnumerator::open(&proc_root) {
                    Ok(pids) => {
                        let count = pids.count();
                        if count == 0 {
                            println!("   ❌ No process entries found");
                            all_ok = false;
                        } else {
                            println!("   ✅ Found {} process entries", count);
                        }
                    }
                    Err(e) => {
                        println!("   ❌ Cannot list process entries: {}", e);
                        all_ok = false;
                    }
                }
            }
            Err(e) => {
                println!("   ❌ {}", e);
                all_ok = false;
            }
        }
    }

    // Check memory counters of our own process
    if memory || all {
        println!("\n💾 Checking memory counters...");
        let pid = std::process::id();
        match reader_for(&proc_root, None).map(|reader| reader.read(pid)) {
            Ok(Ok(Some(p))) => {
                println!(
                    "   ✅ Read own process: URES={}KB, SHR={}KB, VIRT={}KB",
                    p.unique_resident_kb(),
                    p.shared_kb,
                    p.virtual_kb
                );
                match &p.extended {
                    Some(counters) => {
                        println!("   ✅ {} extended status counters", counters.len())
                    }
                    None => println!("   ⚠️  No extended status counters exposed"),
                }
            }
            Ok(Ok(None)) => {
                println!("   ⚠️  Own process was filtered out");
            }
            Ok(Err(e)) => {
                println!("   ❌ Cannot read own process: {}", e);
                all_ok = false;
            }
            Err(e) => {
                println!("   ❌ {}", e);
                all_ok = false;
            }
        }
    }

    // Check the attribution connection
    if database || all {
        println!("\n🐘 Checking database connection...");
        match connect_options(config.database_url.as_deref()).and_then(PgActivityService::connect) {
            Ok(service) => match service.activity_query() {
                Some(shape) => println!("   ✅ Connected, query attribution via {:?}", shape),
                None => println!("   ⚠️  Connected, but the server is too old for query attribution"),
            },
            Err(e) => {
                println!("   ❌ {}", e);
                all_ok = false;
            }
        }
    }

    // Check configuration
    println!("\n⚙️  Checking configuration...");
    match validate_effective_config(config) {
        Ok(_) => {
            println!("   ✅ Configuration is valid");
        }
        Err(e) => {
            println!("   ❌ Configuration invalid: {}", e);
            all_ok = false;
        }
    }

    println!("\n📋 Summary:");
    if all_ok {
        println!("   ✅ All checks passed - system is ready");
        Ok(())
    } else {
        println!("   ❌ Some checks failed - please review warnings");
        std::process::exit(1);
    }
}
