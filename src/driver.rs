use crate::command::{Runner, Step};
use crate::config::Layout;
use crate::error::{Error, Result};
use crate::workdir::WorkdirGuard;
use log::{debug, error, info};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first error and return it.
    #[default]
    Halt,
    /// Log every error and carry on with whatever can still run.
    KeepGoing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildBranch {
    /// The build directory was missing, so it was created and configured.
    Fresh,
    Existing,
}

impl fmt::Display for BuildBranch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            BuildBranch::Fresh => "fresh",
            BuildBranch::Existing => "existing",
        })
    }
}

#[derive(Debug)]
pub struct Report {
    pub branch: BuildBranch,
    /// Steps handed to the runner, whether or not they succeeded.
    pub invocations: usize,
    /// Only ever non-empty under [`FailurePolicy::KeepGoing`].
    pub failures: Vec<Error>,
}

impl Report {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs the project build in the build directory, configuring it first if it has to be created,
/// and then the shader build in the shader directory.
pub struct Driver<'a, R: Runner> {
    base: PathBuf,
    layout: &'a Layout,
    policy: FailurePolicy,
    runner: R,
}

impl<'a, R: Runner> Driver<'a, R> {
    /// Uses the current working directory as the project root.
    pub fn new(layout: &'a Layout, policy: FailurePolicy, runner: R) -> Result<Driver<'a, R>> {
        let base = std::env::current_dir().map_err(Error::CurrentDir)?;
        Ok(Driver::with_base(base, layout, policy, runner))
    }

    pub fn with_base(
        base: PathBuf,
        layout: &'a Layout,
        policy: FailurePolicy,
        runner: R,
    ) -> Driver<'a, R> {
        Driver {
            base,
            layout,
            policy,
            runner,
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn run(&mut self) -> Result<Report> {
        let build_dir = self.base.join(self.layout.build_dir);
        let branch = if build_dir.exists() {
            BuildBranch::Existing
        } else {
            BuildBranch::Fresh
        };
        let mut report = Report {
            branch,
            invocations: 0,
            failures: Vec::new(),
        };

        info!("building project in {build_dir:?} ({branch} build directory)");
        let steps = match branch {
            BuildBranch::Fresh => vec![self.layout.configure, self.layout.build],
            BuildBranch::Existing => vec![self.layout.build],
        };
        if branch == BuildBranch::Existing || self.create_build_dir(&build_dir, &mut report)? {
            self.phase(&build_dir, &steps, &mut report)?;
        }

        let shader_dir = self.base.join(self.layout.shader_dir);
        let shader_build = self.layout.build;
        info!("building shaders in {shader_dir:?}");
        self.phase(&shader_dir, &[shader_build], &mut report)?;

        Ok(report)
    }

    fn create_build_dir(&self, path: &Path, report: &mut Report) -> Result<bool> {
        debug!("creating {path:?}");
        match std::fs::create_dir_all(path) {
            Ok(()) => Ok(true),
            Err(source) => {
                let e = Error::CreateDir {
                    path: path.to_owned(),
                    source,
                };
                self.fail(e, report)?;
                Ok(false)
            }
        }
    }

    fn phase(&mut self, dir: &Path, steps: &[Step], report: &mut Report) -> Result<()> {
        let _guard = match WorkdirGuard::enter(dir) {
            Ok(guard) => guard,
            Err(e) => return self.fail(e, report),
        };
        for step in steps {
            report.invocations += 1;
            if let Err(e) = self.runner.run(step) {
                self.fail(e, report)?;
            }
        }
        Ok(())
    }

    fn fail(&self, e: Error, report: &mut Report) -> Result<()> {
        match self.policy {
            FailurePolicy::Halt => Err(e),
            FailurePolicy::KeepGoing => {
                error!("{e}, continuing");
                report.failures.push(e);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
struct RecordingRunner {
    calls: Vec<(Step, PathBuf)>,
    failing: Option<Step>,
}

#[cfg(test)]
impl RecordingRunner {
    fn new() -> RecordingRunner {
        RecordingRunner {
            calls: Vec::new(),
            failing: None,
        }
    }

    fn failing(step: Step) -> RecordingRunner {
        RecordingRunner {
            calls: Vec::new(),
            failing: Some(step),
        }
    }
}

#[cfg(test)]
impl Runner for RecordingRunner {
    fn run(&mut self, step: &Step) -> Result<()> {
        let dir = std::env::current_dir().map_err(Error::CurrentDir)?;
        self.calls.push((*step, dir.clone()));
        if self.failing == Some(*step) {
            return Err(Error::Spawn {
                step: *step,
                dir,
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "not installed"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
fn project() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().canonicalize().unwrap();
    std::fs::create_dir_all(base.join("res/glsl")).unwrap();
    (dir, base)
}

#[test]
fn fresh_build_configures_then_builds() {
    use crate::config::{CMAKE_CONFIGURE, DEFAULT_LAYOUT, MAKE};
    let _lock = crate::workdir::lock_working_directory();
    let original = std::env::current_dir().unwrap();
    let (_dir, base) = project();

    let mut driver = Driver::with_base(
        base.clone(),
        &DEFAULT_LAYOUT,
        FailurePolicy::Halt,
        RecordingRunner::new(),
    );
    let report = driver.run().unwrap();

    assert_eq!(report.branch, BuildBranch::Fresh);
    assert_eq!(report.invocations, 3);
    assert!(report.succeeded());
    assert!(base.join("build").is_dir());
    assert_eq!(
        driver.runner().calls,
        [
            (CMAKE_CONFIGURE, base.join("build")),
            (MAKE, base.join("build")),
            (MAKE, base.join("res/glsl")),
        ]
    );
    assert_eq!(std::env::current_dir().unwrap(), original);
}

#[test]
fn existing_build_skips_configure() {
    use crate::config::{DEFAULT_LAYOUT, MAKE};
    let _lock = crate::workdir::lock_working_directory();
    let original = std::env::current_dir().unwrap();
    let (_dir, base) = project();
    std::fs::create_dir(base.join("build")).unwrap();

    let mut driver = Driver::with_base(
        base.clone(),
        &DEFAULT_LAYOUT,
        FailurePolicy::Halt,
        RecordingRunner::new(),
    );
    let report = driver.run().unwrap();

    assert_eq!(report.branch, BuildBranch::Existing);
    assert_eq!(report.invocations, 2);
    assert_eq!(
        driver.runner().calls,
        [(MAKE, base.join("build")), (MAKE, base.join("res/glsl"))]
    );
    assert_eq!(std::env::current_dir().unwrap(), original);
}

#[test]
fn second_run_takes_existing_branch() {
    use crate::config::DEFAULT_LAYOUT;
    let _lock = crate::workdir::lock_working_directory();
    let (_dir, base) = project();

    let mut driver = Driver::with_base(
        base,
        &DEFAULT_LAYOUT,
        FailurePolicy::Halt,
        RecordingRunner::new(),
    );
    let first = driver.run().unwrap();
    let second = driver.run().unwrap();

    assert_eq!(first.branch, BuildBranch::Fresh);
    assert_eq!(second.branch, BuildBranch::Existing);
    assert_eq!(driver.runner().calls.len(), 5);
}

#[test]
fn new_uses_invocation_directory() {
    use crate::config::{DEFAULT_LAYOUT, MAKE};
    let _lock = crate::workdir::lock_working_directory();
    let (_dir, base) = project();

    let (report, calls) = {
        let _guard = WorkdirGuard::enter(&base).unwrap();
        let mut driver =
            Driver::new(&DEFAULT_LAYOUT, FailurePolicy::Halt, RecordingRunner::new()).unwrap();
        let report = driver.run().unwrap();
        assert_eq!(std::env::current_dir().unwrap(), base);
        (report, driver.runner.calls)
    };

    assert_eq!(report.branch, BuildBranch::Fresh);
    assert_eq!(calls.last(), Some(&(MAKE, base.join("res/glsl"))));
}

#[test]
fn halt_stops_after_failed_configure() {
    use crate::config::{CMAKE_CONFIGURE, DEFAULT_LAYOUT};
    let _lock = crate::workdir::lock_working_directory();
    let original = std::env::current_dir().unwrap();
    let (_dir, base) = project();

    let mut driver = Driver::with_base(
        base.clone(),
        &DEFAULT_LAYOUT,
        FailurePolicy::Halt,
        RecordingRunner::failing(CMAKE_CONFIGURE),
    );
    let result = driver.run();

    assert!(matches!(result, Err(Error::Spawn { step, .. }) if step == CMAKE_CONFIGURE));
    assert_eq!(driver.runner().calls, [(CMAKE_CONFIGURE, base.join("build"))]);
    assert_eq!(std::env::current_dir().unwrap(), original);
}

#[test]
fn keep_going_runs_every_step() {
    use crate::config::{CMAKE_CONFIGURE, DEFAULT_LAYOUT, MAKE};
    let _lock = crate::workdir::lock_working_directory();
    let original = std::env::current_dir().unwrap();
    let (_dir, base) = project();

    let mut driver = Driver::with_base(
        base.clone(),
        &DEFAULT_LAYOUT,
        FailurePolicy::KeepGoing,
        RecordingRunner::failing(MAKE),
    );
    let report = driver.run().unwrap();

    assert_eq!(report.invocations, 3);
    assert_eq!(report.failures.len(), 2);
    assert!(!report.succeeded());
    match &report.failures[..] {
        [Error::Spawn { dir: first, .. }, Error::Spawn { dir: second, .. }] => {
            assert_eq!(first, &base.join("build"));
            assert_eq!(second, &base.join("res/glsl"));
        }
        other => panic!("unexpected failures: {other:?}"),
    }
    assert_eq!(driver.runner().calls[0], (CMAKE_CONFIGURE, base.join("build")));
    assert_eq!(std::env::current_dir().unwrap(), original);
}

#[test]
fn missing_shader_directory() {
    use crate::config::DEFAULT_LAYOUT;
    let _lock = crate::workdir::lock_working_directory();
    let original = std::env::current_dir().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().canonicalize().unwrap();

    let mut driver = Driver::with_base(
        base.clone(),
        &DEFAULT_LAYOUT,
        FailurePolicy::Halt,
        RecordingRunner::new(),
    );
    match driver.run() {
        Err(Error::EnterDir { path, .. }) => assert_eq!(path, base.join("res/glsl")),
        other => panic!("expected the shader directory to be missing, got {other:?}"),
    }
    assert_eq!(driver.runner().calls.len(), 2);
    assert_eq!(std::env::current_dir().unwrap(), original);
}

#[test]
fn build_path_is_a_file() {
    use crate::config::DEFAULT_LAYOUT;
    let _lock = crate::workdir::lock_working_directory();
    let (_dir, base) = project();
    std::fs::write(base.join("build"), "").unwrap();

    let mut driver = Driver::with_base(
        base.clone(),
        &DEFAULT_LAYOUT,
        FailurePolicy::KeepGoing,
        RecordingRunner::new(),
    );
    let report = driver.run().unwrap();

    assert_eq!(report.branch, BuildBranch::Existing);
    assert!(matches!(report.failures[..], [Error::EnterDir { .. }]));
    assert_eq!(report.invocations, 1);
}
