//! Actor identity resolution for CLI commands.
//!
//! The resolution chain: `--actor` flag > `FIXTRACK_ACTOR` env > `USER` env
//! (TTY only). Mutating commands record the actor for attribution; a
//! missing actor is recorded as "unattributed" by the core, so resolution
//! never fails — it just returns `None`.

use std::env;

/// Environment reader trait for dependency injection in tests.
trait EnvReader {
    fn get(&self, key: &str) -> Option<String>;
    fn is_tty(&self) -> bool;
}

/// Real environment reader.
struct RealEnv;

impl EnvReader for RealEnv {
    fn get(&self, key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.is_empty())
    }

    fn is_tty(&self) -> bool {
        use std::io::IsTerminal;
        std::io::stdin().is_terminal()
    }
}

/// Core resolution logic, parameterized by environment reader.
fn resolve_actor_with(cli_flag: Option<&str>, env: &dyn EnvReader) -> Option<String> {
    if let Some(actor) = cli_flag {
        if !actor.is_empty() {
            return Some(actor.to_string());
        }
    }

    if let Some(val) = env.get("FIXTRACK_ACTOR") {
        return Some(val);
    }

    // USER only when interactive: piped invocations from other tools
    // should stay unattributed rather than inherit the daemon's user.
    if env.is_tty() {
        if let Some(val) = env.get("USER") {
            return Some(val);
        }
    }

    None
}

/// Resolve the actor identity for attribution.
pub fn resolve_actor(cli_flag: Option<&str>) -> Option<String> {
    resolve_actor_with(cli_flag, &RealEnv)
}

#[cfg(test)]
mod tests {
    use super::{EnvReader, resolve_actor_with};
    use std::collections::HashMap;

    struct FakeEnv {
        vars: HashMap<&'static str, &'static str>,
        tty: bool,
    }

    impl EnvReader for FakeEnv {
        fn get(&self, key: &str) -> Option<String> {
            self.vars.get(key).map(|v| (*v).to_string())
        }

        fn is_tty(&self) -> bool {
            self.tty
        }
    }

    #[test]
    fn flag_wins_over_everything() {
        let env = FakeEnv {
            vars: HashMap::from([("FIXTRACK_ACTOR", "env-actor"), ("USER", "shell-user")]),
            tty: true,
        };
        assert_eq!(
            resolve_actor_with(Some("flag-actor"), &env),
            Some("flag-actor".to_string())
        );
    }

    #[test]
    fn env_var_beats_user() {
        let env = FakeEnv {
            vars: HashMap::from([("FIXTRACK_ACTOR", "env-actor"), ("USER", "shell-user")]),
            tty: true,
        };
        assert_eq!(resolve_actor_with(None, &env), Some("env-actor".to_string()));
    }

    #[test]
    fn user_only_applies_on_a_tty() {
        let vars = HashMap::from([("USER", "shell-user")]);
        let tty = FakeEnv {
            vars: vars.clone(),
            tty: true,
        };
        assert_eq!(resolve_actor_with(None, &tty), Some("shell-user".to_string()));

        let piped = FakeEnv { vars, tty: false };
        assert_eq!(resolve_actor_with(None, &piped), None);
    }

    #[test]
    fn empty_flag_falls_through() {
        let env = FakeEnv {
            vars: HashMap::new(),
            tty: false,
        };
        assert_eq!(resolve_actor_with(Some(""), &env), None);
    }
}
