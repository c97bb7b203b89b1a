//! Shell script helpers: interpreter selection, shebangs and `cd` handling.

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
};

use present_core::Environment;

use crate::error::StartError;

/// Unix shell types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnixShell {
    Zsh(PathBuf),
    Bash(PathBuf),
    Sh(PathBuf),
    Other(PathBuf),
}

impl UnixShell {
    /// Get the shell path.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Zsh(p) | Self::Bash(p) | Self::Sh(p) | Self::Other(p) => p,
        }
    }

    /// The shell named by `$SHELL` in `env`, or `/bin/sh`.
    #[must_use]
    pub fn from_env(env: &dyn Environment) -> Self {
        env.var("SHELL")
            .and_then(|shell| Self::from_path(Path::new(&shell)))
            .unwrap_or_else(|| Self::Sh(PathBuf::from("/bin/sh")))
    }

    /// Create from a path.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        if !(path.is_absolute() && path.is_file()) {
            return None;
        }
        let path_buf = path.to_path_buf();
        let shell = match path.file_name().and_then(OsStr::to_str) {
            Some("zsh") => Self::Zsh(path_buf),
            Some("bash") => Self::Bash(path_buf),
            Some("sh") => Self::Sh(path_buf),
            _ => Self::Other(path_buf),
        };
        Some(shell)
    }
}

/// Resolve an executable by name against the `PATH` of `env`.
///
/// Absolute paths are returned as-is so that a missing binary surfaces as a
/// spawn error.
///
/// # Errors
/// Returns `NotFound` if the name is empty or not on `PATH`.
pub fn resolve_executable(
    program: &str,
    env: &dyn Environment,
    cwd: Option<&Path>,
) -> Result<PathBuf, StartError> {
    if program.trim().is_empty() {
        return Err(StartError::NotFound(program.to_string()));
    }
    let path = Path::new(program);
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    let cwd = cwd
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_default();
    which::which_in(program, env.var("PATH"), cwd)
        .map_err(|_| StartError::NotFound(program.to_string()))
}

/// Interpreter named by a leading `#!` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shebang {
    pub program: String,
    pub args: Vec<String>,
}

/// A script split into its optional shebang, optional `cd` and the rest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub shebang: Option<Shebang>,
    /// Argument of a leading `cd` line; `Some(None)` for a bare `cd`.
    pub cd: Option<Option<String>>,
    /// Text to feed the interpreter, with the `cd` line removed.
    pub text: String,
}

impl Script {
    /// Split `body` into shebang, leading `cd` and remaining text.
    ///
    /// Only the first significant line after the shebang is inspected, and
    /// only a plain `cd [dir]` is intercepted; compound lines such as
    /// `cd x && make` go to the interpreter untouched.
    ///
    /// # Errors
    /// Returns `EmptyShebang` for a `#!` line without an interpreter.
    pub fn parse(body: &str) -> Result<Self, StartError> {
        let body = body.trim_start();
        let mut lines = body.split_inclusive('\n').peekable();

        let mut text = String::new();
        let mut shebang = None;
        if let Some(first) = lines.next_if(|l| l.starts_with("#!")) {
            let mut fields = first[2..].split_whitespace().map(str::to_string);
            let program = fields.next().ok_or(StartError::EmptyShebang)?;
            shebang = Some(Shebang {
                program,
                args: fields.collect(),
            });
            text.push_str(first);
        }

        while let Some(blank) = lines.next_if(|l| l.trim().is_empty()) {
            text.push_str(blank);
        }

        let mut cd = None;
        if let Some(line) = lines.peek() {
            if let Some(target) = parse_cd(line) {
                cd = Some(target);
                lines.next();
            }
        }
        text.extend(lines);

        Ok(Self { shebang, cd, text })
    }

    /// Whether nothing but the shebang and blank lines remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text
            .lines()
            .all(|l| l.trim().is_empty() || l.starts_with("#!"))
    }
}

fn parse_cd(line: &str) -> Option<Option<String>> {
    let words = shlex::split(line.trim())?;
    match words.as_slice() {
        [cmd] if cmd == "cd" => Some(None),
        [cmd, dir] if cmd == "cd" => Some(Some(dir.clone())),
        _ => None,
    }
}

/// Home directory, preferring `$HOME` from `env`.
#[must_use]
pub fn home_dir(env: &dyn Environment) -> Option<PathBuf> {
    env.var("HOME").map(PathBuf::from).or_else(dirs::home_dir)
}

/// Resolve a `cd` target against the current working directory.
///
/// A leading `~` expands to the home directory; relative paths are joined to
/// `current` (or the server's working directory). The result must be an
/// existing directory and is canonicalised.
///
/// # Errors
/// Returns error if the target does not exist or is not a directory.
pub async fn resolve_cd(
    target: &str,
    current: Option<&Path>,
    env: &dyn Environment,
) -> Result<PathBuf, StartError> {
    let expanded = match target.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => {
            let home = home_dir(env).unwrap_or_default();
            home.join(rest.trim_start_matches('/'))
        }
        _ => PathBuf::from(target),
    };

    let joined = if expanded.is_absolute() {
        expanded
    } else {
        let base = match current {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir()?,
        };
        base.join(expanded)
    };

    let resolved = tokio::fs::canonicalize(&joined)
        .await
        .map_err(|source| StartError::Chdir {
            path: joined.clone(),
            source,
        })?;
    if !tokio::fs::metadata(&resolved).await?.is_dir() {
        return Err(StartError::NotADirectory(joined));
    }
    Ok(resolved)
}
