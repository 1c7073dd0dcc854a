//! paddle-bootstrap: startup layer for the native Paddle core.
//!
//! - **Discovery**: locates the core and the install `libs` directory
//! - **Static TLS workaround**: preloads `libgomp` on glibc < 2.23
//! - **AVX check**: warns when host and core disagree on AVX
//! - **Exports**: resolves the core's symbol groups into an export table
//! - **Prim flags**: `FLAGS_prim_*` and the prim configuration object
//!
//! # Quick Start
//!
//! ```ignore
//! use paddle_bootstrap::{bootstrap, BootstrapOptions, ProcessEnv, ShellRunner};
//!
//! let env = ProcessEnv;
//! let options = BootstrapOptions::from_env(&env);
//! let outcome = bootstrap(&options, &env, &ShellRunner)?;
//! for advisory in &outcome.advisories {
//!     eprintln!("{advisory}");
//! }
//! let runtime = outcome.value;
//! runtime.sync_prim_flags(&env)?;
//! ```

pub mod bootstrap;
pub mod cpu;
pub mod discovery;
pub mod env;
pub mod error;
pub mod flags;
pub mod libc;
pub mod native;
pub mod options;
pub mod platform;
pub mod preload;
pub mod prim;
pub mod report;
pub mod shell;

pub use bootstrap::{bootstrap, Runtime};
pub use cpu::{avx_supported, AvxProbe, AvxReport};
pub use discovery::{find_first_existing, CoreLayout};
pub use env::{is_truthy, EnvSource, MapEnv, ProcessEnv};
pub use error::{Advisory, BootstrapError, BootstrapResult, FlagError, Outcome};
pub use flags::FeatureFlags;
pub use libc::{less_than_ver, LibcInfo, LibcKind, Version};
pub use native::{ExportTable, NativeCore, NativePrimController, SymbolGroup};
pub use options::BootstrapOptions;
pub use platform::Platform;
pub use prim::{PrimConfig, PrimController, PrimState};
pub use report::BootstrapReport;
pub use shell::{run_shell_command, CommandRunner, ShellRunner};
