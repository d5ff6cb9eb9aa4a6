//! Sandboxed test runs against the freshly built package.
//!
//! Tests must import the staged build, not the source tree. The runner:
//!
//! 1. runs the build hook into staging (models compiled, package staged)
//! 2. locks and snapshots the resolution state ([`ResolutionGuard`])
//! 3. puts staging first on the search path and resets the loaded cache
//! 4. requires the package at exactly the manifest version
//! 5. hands an [`ActivationContext`] to the [`TestExecutor`]
//! 6. restores the snapshot, on every exit path

pub mod resolution;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};

pub use resolution::{
    ActivationContext, Distribution, LoadedDistributions, ResolutionGuard, ResolutionSnapshot,
    SandboxError,
};

use crate::builder::BackendRegistry;
use crate::core::Workspace;
use crate::ops::lifecycle::build_hook;
use crate::util::fs::normalize_path;
use crate::util::process::ProcessBuilder;
use crate::util::shell::{Shell, Status};

/// Environment variable enabling slow test suites.
pub const TEST_SLOW_ENV: &str = "TEST_SLOW";

/// Which tests to run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestSelector {
    /// Run `<module>.test_suite`
    pub module: Option<String>,
    /// Run a single test, case or suite
    pub suite: Option<String>,
    /// Replacement runner command line
    pub runner: Option<String>,
    /// Include slow suites
    pub slow: bool,
}

impl TestSelector {
    /// Dotted name handed to the runner, if any.
    pub fn target(&self, default_suite: Option<&str>) -> Result<Option<String>> {
        match (&self.module, &self.suite) {
            (Some(_), Some(_)) => bail!("a test module and a test suite cannot both be given"),
            (Some(module), None) => Ok(Some(format!("{}.test_suite", module))),
            (None, Some(suite)) => Ok(Some(suite.clone())),
            (None, None) => Ok(default_suite.map(str::to_string)),
        }
    }
}

/// Outcome of a test run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    pub success: bool,
    /// Runner exit code, when it exited normally
    pub code: Option<i32>,
}

/// Runs a test selection inside an activated sandbox.
pub trait TestExecutor {
    fn execute(&self, ctx: &ActivationContext<'_>, selector: &TestSelector) -> Result<TestResult>;
}

/// Runs the manifest's test command as a subprocess.
#[derive(Debug, Clone)]
pub struct CommandTestExecutor {
    command: Vec<String>,
    default_suite: Option<String>,
    cwd: PathBuf,
}

impl CommandTestExecutor {
    /// Executor for the workspace's `[test]` settings, run from staging.
    pub fn for_workspace(ws: &Workspace) -> Self {
        let test = &ws.manifest().test;
        CommandTestExecutor {
            command: test.command.clone(),
            default_suite: test.suite.clone(),
            cwd: ws.build_lib().to_path_buf(),
        }
    }

    /// Build the runner process for a selector.
    pub fn process(
        &self,
        ctx: &ActivationContext<'_>,
        selector: &TestSelector,
    ) -> Result<ProcessBuilder> {
        let argv: Vec<String> = match &selector.runner {
            Some(runner) => runner.split_whitespace().map(str::to_string).collect(),
            None => self.command.clone(),
        };
        let Some((program, args)) = argv.split_first() else {
            bail!("test command is empty\nhelp: set `command` in the [test] table of the manifest");
        };

        let mut process = ProcessBuilder::new(program)
            .args(args)
            .args(selector.target(self.default_suite.as_deref())?)
            .cwd(&self.cwd);
        if let Some(value) = ctx.search_path_value() {
            process = process.env(ctx.search_path_var(), value);
        }
        if selector.slow {
            process = process.env(TEST_SLOW_ENV, "1");
        }
        Ok(process)
    }
}

impl TestExecutor for CommandTestExecutor {
    fn execute(&self, ctx: &ActivationContext<'_>, selector: &TestSelector) -> Result<TestResult> {
        let status = self.process(ctx, selector)?.status()?;
        Ok(TestResult {
            success: status.success(),
            code: status.code(),
        })
    }
}

/// Builds the package into staging and runs its tests against that build.
pub struct SandboxedTestRunner<'a, E: TestExecutor> {
    ws: &'a Workspace,
    registry: &'a BackendRegistry,
    executor: E,
    selection: Option<Vec<String>>,
    shell: Option<Arc<Shell>>,
}

impl<'a, E: TestExecutor> SandboxedTestRunner<'a, E> {
    pub fn new(ws: &'a Workspace, registry: &'a BackendRegistry, executor: E) -> Self {
        SandboxedTestRunner {
            ws,
            registry,
            executor,
            selection: None,
            shell: None,
        }
    }

    /// Use a fixed backend selection instead of `STAN_BACKEND`.
    pub fn with_selection(mut self, names: Vec<String>) -> Self {
        self.selection = Some(names);
        self
    }

    /// Report progress through `shell`.
    pub fn with_shell(mut self, shell: Arc<Shell>) -> Self {
        self.shell = Some(shell);
        self
    }

    /// Build, activate and run the selected tests.
    ///
    /// The resolution state is restored before this returns, also when the
    /// executor fails or panics. A restore that cannot be verified is an
    /// error even when the tests passed.
    pub fn run_tests(&self, selector: &TestSelector) -> Result<TestResult> {
        let mut hook = build_hook(self.ws, self.registry);
        if let Some(names) = &self.selection {
            hook = hook.with_selection(names.clone());
        }
        if let Some(shell) = &self.shell {
            hook = hook.with_shell(Arc::clone(shell));
        }
        hook.run()?;

        let staging = normalize_path(self.ws.build_lib());
        let mut guard = ResolutionGuard::acquire(&self.ws.manifest().test.search_path_var);
        let result = self.run_activated(&mut guard, &staging, selector);

        finish_run(result, guard.restore())
    }

    fn run_activated(
        &self,
        guard: &mut ResolutionGuard,
        staging: &Path,
        selector: &TestSelector,
    ) -> Result<TestResult> {
        guard.prepend_search_path(staging)?;
        guard.reset_loaded();

        let identity = self.ws.identity();
        let mut ctx = guard.activation();
        ctx.require(identity.name(), identity.version())?;

        if let Some(shell) = &self.shell {
            shell.status(Status::Testing, format!("{} from {}", identity, staging.display()));
        }
        self.executor.execute(&ctx, selector)
    }
}

/// Combine the test outcome with the restore outcome.
///
/// A failed restore always fails the run. When the tests had already
/// errored, the restore failure wraps that error.
fn finish_run(result: Result<TestResult>, restore: Result<(), SandboxError>) -> Result<TestResult> {
    match (result, restore) {
        (Ok(result), Ok(())) => Ok(result),
        (Ok(_), Err(restore)) => Err(restore.into()),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(restore)) => Err(e.context(restore)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{BackendId, ConfigurationError};
    use crate::test_support::{registry_with, FakeBuilder, PackageFixture};
    use std::cell::RefCell;
    use std::ffi::OsString;
    use std::panic::{catch_unwind, AssertUnwindSafe};
    use tempfile::TempDir;

    #[derive(Debug, Clone, Copy)]
    enum Behavior {
        Pass,
        Fail,
        Error,
        Panic,
    }

    /// What the executor observed while the sandbox was active.
    #[derive(Debug, Default)]
    struct Observed {
        search_path: Option<OsString>,
        activated: Vec<Distribution>,
    }

    struct FakeExecutor {
        behavior: Behavior,
        observed: RefCell<Observed>,
    }

    impl FakeExecutor {
        fn new(behavior: Behavior) -> Self {
            FakeExecutor {
                behavior,
                observed: RefCell::new(Observed::default()),
            }
        }
    }

    impl TestExecutor for FakeExecutor {
        fn execute(&self, ctx: &ActivationContext<'_>, _: &TestSelector) -> Result<TestResult> {
            *self.observed.borrow_mut() = Observed {
                search_path: std::env::var_os(ctx.search_path_var()),
                activated: ctx.activated().to_vec(),
            };
            match self.behavior {
                Behavior::Pass => Ok(TestResult {
                    success: true,
                    code: Some(0),
                }),
                Behavior::Fail => Ok(TestResult {
                    success: false,
                    code: Some(1),
                }),
                Behavior::Error => bail!("runner crashed"),
                Behavior::Panic => panic!("executor panicked"),
            }
        }
    }

    /// Workspace whose search path lives in its own environment variable.
    fn workspace(tmp: &TempDir, var: &str) -> Workspace {
        let manifest = PackageFixture::new("fbprophet")
            .manifest_extra(format!("\n[test]\nsearch-path-var = \"{}\"\n", var))
            .write(tmp.path());
        Workspace::new(&manifest).unwrap()
    }

    fn registry() -> BackendRegistry {
        registry_with(vec![FakeBuilder::ok(BackendId::PyStan)])
    }

    fn assert_restored(var: &str, original: &str) {
        assert_eq!(std::env::var_os(var), Some(OsString::from(original)));
        assert!(resolution::loaded_snapshot().get("fbprophet").is_none());
    }

    #[test]
    fn test_passing_run_sees_staging_first_and_restores() {
        let var = "STANBUILD_TEST_SANDBOX_PASS";
        std::env::set_var(var, "/original");
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp, var);
        let registry = registry();
        let executor = FakeExecutor::new(Behavior::Pass);

        let runner = SandboxedTestRunner::new(&ws, &registry, executor)
            .with_selection(vec!["PYSTAN".into()]);
        let result = runner.run_tests(&TestSelector::default()).unwrap();

        assert!(result.success);
        let observed = runner.executor.observed.borrow();
        let entries: Vec<_> =
            std::env::split_paths(observed.search_path.as_ref().unwrap()).collect();
        assert_eq!(entries[0], normalize_path(&tmp.path().join("build/lib")));
        assert_eq!(entries[1], PathBuf::from("/original"));
        assert_eq!(observed.activated.len(), 1);
        assert_eq!(observed.activated[0].version, "0.6.1");
        assert!(ws
            .staging_model_target()
            .join("prophet_model.pkl")
            .is_file());
        assert!(!ws.inplace_model_target().exists());
        assert_restored(var, "/original");
    }

    #[test]
    fn test_failing_tests_restore() {
        let var = "STANBUILD_TEST_SANDBOX_FAIL";
        std::env::set_var(var, "/original");
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp, var);
        let registry = registry();

        let result = SandboxedTestRunner::new(&ws, &registry, FakeExecutor::new(Behavior::Fail))
            .with_selection(vec!["PYSTAN".into()])
            .run_tests(&TestSelector::default())
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.code, Some(1));
        assert_restored(var, "/original");
    }

    #[test]
    fn test_executor_error_restores() {
        let var = "STANBUILD_TEST_SANDBOX_ERROR";
        std::env::set_var(var, "/original");
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp, var);
        let registry = registry();

        let err = SandboxedTestRunner::new(&ws, &registry, FakeExecutor::new(Behavior::Error))
            .with_selection(vec!["PYSTAN".into()])
            .run_tests(&TestSelector::default())
            .unwrap_err();

        assert!(err.to_string().contains("runner crashed"));
        assert_restored(var, "/original");
    }

    #[test]
    fn test_executor_panic_restores() {
        let var = "STANBUILD_TEST_SANDBOX_PANIC";
        std::env::set_var(var, "/original");
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp, var);
        let registry = registry();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            SandboxedTestRunner::new(&ws, &registry, FakeExecutor::new(Behavior::Panic))
                .with_selection(vec!["PYSTAN".into()])
                .run_tests(&TestSelector::default())
        }));

        assert!(outcome.is_err());
        assert_restored(var, "/original");
    }

    #[test]
    fn test_unset_search_path_stays_unset() {
        let var = "STANBUILD_TEST_SANDBOX_UNSET";
        std::env::remove_var(var);
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp, var);
        let registry = registry();

        SandboxedTestRunner::new(&ws, &registry, FakeExecutor::new(Behavior::Pass))
            .with_selection(vec!["PYSTAN".into()])
            .run_tests(&TestSelector::default())
            .unwrap();

        assert!(std::env::var_os(var).is_none());
    }

    #[test]
    fn test_preloaded_cache_survives_run() {
        let var = "STANBUILD_TEST_SANDBOX_CACHE";
        std::env::set_var(var, "/original");
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp, var);
        let registry = registry();
        let preloaded = Distribution {
            name: "sandbox-cache-probe".into(),
            version: "1.0.0".into(),
            location: PathBuf::from("/site-packages"),
        };
        resolution::record_loaded(preloaded.clone());

        SandboxedTestRunner::new(&ws, &registry, FakeExecutor::new(Behavior::Pass))
            .with_selection(vec!["PYSTAN".into()])
            .run_tests(&TestSelector::default())
            .unwrap();

        assert_eq!(
            resolution::loaded_snapshot().get("sandbox-cache-probe"),
            Some(&preloaded)
        );
        assert_restored(var, "/original");
    }

    #[test]
    fn test_build_failure_never_activates() {
        let var = "STANBUILD_TEST_SANDBOX_BUILD_FAIL";
        std::env::set_var(var, "/original");
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp, var);
        let registry = registry_with(vec![FakeBuilder::failing(BackendId::PyStan, "boom")]);
        let executor = FakeExecutor::new(Behavior::Pass);

        let runner = SandboxedTestRunner::new(&ws, &registry, executor)
            .with_selection(vec!["PYSTAN".into()]);
        assert!(runner.run_tests(&TestSelector::default()).is_err());

        assert!(runner.executor.observed.borrow().search_path.is_none());
        assert_restored(var, "/original");
    }

    #[test]
    fn test_unknown_backend_is_configuration_error() {
        let var = "STANBUILD_TEST_SANDBOX_UNKNOWN";
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp, var);
        let registry = registry();

        let err = SandboxedTestRunner::new(&ws, &registry, FakeExecutor::new(Behavior::Pass))
            .with_selection(vec!["backendX".into()])
            .run_tests(&TestSelector::default())
            .unwrap_err();

        assert!(format!("{:#}", err).contains("`backendX`"));
    }

    #[test]
    fn test_restore_failure_wraps_executor_error() {
        let restore = || SandboxError::RestoreFailed {
            var: "PYTHONPATH".into(),
        };

        let err = finish_run(Err(anyhow::anyhow!("runner crashed")), Err(restore())).unwrap_err();
        assert!(err.downcast_ref::<SandboxError>().is_some());
        let chain = format!("{:#}", err);
        assert!(chain.contains("failed to restore `PYTHONPATH`"));
        assert!(chain.contains("runner crashed"));

        let passed = Ok(TestResult {
            success: true,
            code: Some(0),
        });
        let err = finish_run(passed, Err(restore())).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SandboxError>(),
            Some(SandboxError::RestoreFailed { .. })
        ));
    }

    #[test]
    fn test_selector_target() {
        let default = Some("fbprophet.tests");
        assert_eq!(
            TestSelector::default().target(default).unwrap().as_deref(),
            Some("fbprophet.tests")
        );
        let module = TestSelector {
            module: Some("fbprophet.tests.test_diagnostics".into()),
            ..Default::default()
        };
        assert_eq!(
            module.target(default).unwrap().as_deref(),
            Some("fbprophet.tests.test_diagnostics.test_suite")
        );
        let both = TestSelector {
            module: Some("a".into()),
            suite: Some("b".into()),
            ..Default::default()
        };
        assert!(both.target(default).is_err());
    }

    #[test]
    fn test_command_executor_process() {
        let var = "STANBUILD_TEST_SANDBOX_COMMAND";
        std::env::remove_var(var);
        let tmp = TempDir::new().unwrap();
        let ws = workspace(&tmp, var);
        let executor = CommandTestExecutor::for_workspace(&ws);

        let mut guard = ResolutionGuard::acquire(var);
        guard.prepend_search_path(Path::new("/staging")).unwrap();
        let ctx = guard.activation();

        let selector = TestSelector {
            suite: Some("fbprophet.tests.test_prophet".into()),
            slow: true,
            ..Default::default()
        };
        let process = executor.process(&ctx, &selector).unwrap();
        assert_eq!(process.get_program(), Path::new("python"));
        let args: Vec<_> = process.get_args().iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["-m", "unittest", "fbprophet.tests.test_prophet"]);
        assert_eq!(process.get_env(TEST_SLOW_ENV), Some(std::ffi::OsStr::new("1")));
        assert_eq!(process.get_env(var), Some(std::ffi::OsStr::new("/staging")));

        let runner = TestSelector {
            runner: Some("pytest -x".into()),
            ..Default::default()
        };
        let process = executor.process(&ctx, &runner).unwrap();
        assert_eq!(process.get_program(), Path::new("pytest"));
        assert!(process.get_env(TEST_SLOW_ENV).is_none());
    }

    #[test]
    fn test_require_error_is_configuration_error() {
        let var = "STANBUILD_TEST_SANDBOX_REQUIRE";
        std::env::remove_var(var);
        let tmp = TempDir::new().unwrap();

        let mut guard = ResolutionGuard::acquire(var);
        guard.prepend_search_path(tmp.path()).unwrap();
        let err = guard
            .activation()
            .require("fbprophet", &semver::Version::new(0, 6, 1))
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::PackageNotFound { .. }));
    }
}
