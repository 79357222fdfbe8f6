use console::style;
use gardener::config::is_production_like;
use inquire::Confirm;

/// Asks before destructive commands in production-like environments
#[derive(Debug, Clone)]
pub struct ConfirmGate {
    environment: String,
    interactive: bool,
}

impl ConfirmGate {
    pub fn new(environment: impl Into<String>) -> Self {
        Self::with_interactive(environment, console::user_attended())
    }

    /// Gate with an explicit terminal mode; a non-interactive gate declines
    pub fn with_interactive(environment: impl Into<String>, interactive: bool) -> Self {
        Self {
            environment: environment.into(),
            interactive,
        }
    }

    pub fn needs_confirmation(&self) -> bool {
        is_production_like(&self.environment)
    }

    /// Whether the command may proceed
    pub fn confirm_to_proceed(&self, force: bool) -> bool {
        if force || !self.needs_confirmation() {
            return true;
        }

        println!("{}", style("**************************************").yellow());
        println!(
            "{}",
            style(format!("*     Application In {}!     *", self.environment))
                .yellow()
                .bold()
        );
        println!("{}", style("**************************************").yellow());
        println!();

        if !self.interactive {
            println!("Not running interactively, use --force to proceed.");
            return false;
        }

        Confirm::new("Do you really wish to run this command?")
            .with_default(false)
            .prompt()
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_production_always_proceeds() {
        let gate = ConfirmGate::with_interactive("testing", false);
        assert!(!gate.needs_confirmation());
        assert!(gate.confirm_to_proceed(false));
    }

    #[test]
    fn test_force_skips_prompt() {
        let gate = ConfirmGate::with_interactive("production", false);
        assert!(gate.confirm_to_proceed(true));
    }

    #[test]
    fn test_production_without_terminal_declines() {
        let gate = ConfirmGate::with_interactive("prod", false);
        assert!(gate.needs_confirmation());
        assert!(!gate.confirm_to_proceed(false));
    }
}
