//! Front-end state: last listing, current selection and which actions are
//! allowed, independently of how they are rendered.
use crate::adapters::{AdapterControl, AdapterRecord, AdapterStatus, AdminState};
use crate::error::NicError;
use thiserror::Error;
use tracing::{debug, error};

/// User action offered by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    #[allow(missing_docs)]
    Refresh,
    #[allow(missing_docs)]
    Enable,
    #[allow(missing_docs)]
    Disable,
}

#[derive(Debug, Error)]
/// Error specific to [`Session`].
pub enum SessionError {
    #[allow(missing_docs)]
    #[error("Invalid selection {0}")]
    InvalidSelection(usize),
    #[allow(missing_docs)]
    #[error("Please select an adapter first")]
    NoSelection,
    /// Gating refused the action, e.g. not elevated or already in that state.
    #[error("Action {0:?} is not available")]
    Unavailable(Action),
    #[allow(missing_docs)]
    #[error(transparent)]
    Adapter(#[from] NicError),
}

/// Interactive session over an [`AdapterControl`].
pub struct Session<'a> {
    control: &'a dyn AdapterControl,
    elevated: bool,
    adapters: Vec<AdapterRecord>,
    selected: Option<usize>,
    status: String,
}

impl<'a> Session<'a> {
    /// Create a session. Nothing is listed until [`Session::refresh`].
    pub fn new(control: &'a dyn AdapterControl, elevated: bool) -> Self {
        let status = if elevated {
            "Ready.".to_owned()
        } else {
            NOT_ELEVATED.to_owned()
        };
        Self {
            control,
            elevated,
            adapters: Vec::new(),
            selected: None,
            status,
        }
    }

    /// Whether the process holds administrator rights.
    pub fn is_elevated(&self) -> bool {
        self.elevated
    }

    /// Adapters of the last successful listing.
    pub fn adapters(&self) -> &[AdapterRecord] {
        &self.adapters
    }

    /// Currently selected adapter.
    pub fn selected(&self) -> Option<&AdapterRecord> {
        self.selected.and_then(|i| self.adapters.get(i))
    }

    /// Text of the status bar.
    pub fn status_line(&self) -> &str {
        &self.status
    }

    /// List adapters again. The selection is cleared; on failure the list is
    /// emptied too.
    pub fn refresh(&mut self) -> Result<(), SessionError> {
        self.selected = None;
        match self.control.list_adapters() {
            Ok(listing) => {
                self.adapters = listing.adapters;
                self.status = if !self.elevated {
                    NOT_ELEVATED.to_owned()
                } else if self.adapters.is_empty() {
                    "No network adapter found.".to_owned()
                } else {
                    "Adapter list loaded. Please select one.".to_owned()
                };
                Ok(())
            }
            Err(e) => {
                error!("{}", e);
                self.adapters.clear();
                self.status = "Failed to load the adapter list!".to_owned();
                Err(e.into())
            }
        }
    }

    /// Select the adapter at `index` in the last listing.
    pub fn select(&mut self, index: usize) -> Result<&AdapterRecord, SessionError> {
        let Some(adapter) = self.adapters.get(index) else {
            return Err(SessionError::InvalidSelection(index));
        };
        debug!("Selected {:?}", adapter);
        self.selected = Some(index);
        self.status = format!("Selected: {}", adapter.name);
        Ok(adapter)
    }

    /// Actions the user may trigger right now.
    ///
    /// Enable and disable need elevation and a selected adapter whose status
    /// is the opposite one.
    pub fn available_actions(&self) -> Vec<Action> {
        let mut actions = vec![Action::Refresh];
        if !self.elevated {
            return actions;
        }
        match self.selected().map(|a| &a.status) {
            Some(AdapterStatus::Disabled) => actions.push(Action::Enable),
            Some(AdapterStatus::Enabled) => actions.push(Action::Disable),
            _ => {}
        }
        actions
    }

    /// Apply `state` to the selected adapter, then refresh the listing.
    ///
    /// Return the message of the controller.
    pub fn apply(&mut self, state: AdminState) -> Result<String, SessionError> {
        let action = match state {
            AdminState::Enable => Action::Enable,
            AdminState::Disable => Action::Disable,
        };
        let name = match self.selected() {
            Some(adapter) => adapter.name.clone(),
            None if self.elevated => return Err(SessionError::NoSelection),
            None => return Err(SessionError::Unavailable(action)),
        };
        if !self.available_actions().contains(&action) {
            return Err(SessionError::Unavailable(action));
        }
        match self.control.set_admin_state(&name, state) {
            Ok(message) => {
                // A failed refresh already shows in the status line.
                let _ = self.refresh();
                Ok(message)
            }
            Err(e) => {
                self.status = format!("Failed to {state} '{name}'.");
                Err(e.into())
            }
        }
    }
}

const NOT_ELEVATED: &str =
    "Warning: not running as administrator, adapters cannot be enabled or disabled.";

#[cfg(test)]
mod should {
    use super::*;
    use crate::adapters::{Listing, MockAdapterControl};
    use crate::error::ErrorKind;
    use test_log::test;

    fn listing() -> Listing {
        Listing {
            adapters: vec![
                AdapterRecord {
                    name: "Ethernet".into(),
                    status: AdapterStatus::Enabled,
                },
                AdapterRecord {
                    name: "Wi-Fi".into(),
                    status: AdapterStatus::Disabled,
                },
                AdapterRecord {
                    name: "Loopback".into(),
                    status: AdapterStatus::Other("Unknown".into()),
                },
            ],
            diagnostics: vec![],
        }
    }

    fn control() -> MockAdapterControl {
        let mut mock = MockAdapterControl::new();
        mock.expect_list_adapters().returning(|| Ok(listing()));
        mock
    }

    #[test]
    fn only_refresh_without_elevation() {
        let mock = control();
        let mut session = Session::new(&mock, false);
        session.refresh().unwrap();
        assert!(session.status_line().starts_with("Warning"));
        session.select(1).unwrap();
        assert_eq!(session.available_actions(), [Action::Refresh]);
    }

    #[test]
    fn gate_actions_on_status() {
        let mock = control();
        let mut session = Session::new(&mock, true);
        session.refresh().unwrap();
        assert_eq!(session.available_actions(), [Action::Refresh]);
        session.select(0).unwrap();
        assert_eq!(session.available_actions(), [Action::Refresh, Action::Disable]);
        session.select(1).unwrap();
        assert_eq!(session.available_actions(), [Action::Refresh, Action::Enable]);
        session.select(2).unwrap();
        assert_eq!(session.available_actions(), [Action::Refresh]);
    }

    #[test]
    fn reject_out_of_range_selection() {
        let mock = control();
        let mut session = Session::new(&mock, true);
        session.refresh().unwrap();
        assert!(matches!(
            session.select(3),
            Err(SessionError::InvalidSelection(3))
        ));
        assert!(session.selected().is_none());
    }

    #[test]
    fn apply_and_refresh() {
        let mut mock = control();
        mock.expect_set_admin_state()
            .withf(|name, state| name == "Wi-Fi" && *state == AdminState::Enable)
            .times(1)
            .returning(|_, _| Ok("accepted".into()));
        let mut session = Session::new(&mock, true);
        session.refresh().unwrap();
        session.select(1).unwrap();
        assert_eq!(session.apply(AdminState::Enable).unwrap(), "accepted");
        assert!(session.selected().is_none());
    }

    #[test]
    fn refuse_unavailable_action() {
        let mut mock = control();
        mock.expect_set_admin_state().times(0);
        let mut session = Session::new(&mock, true);
        session.refresh().unwrap();
        assert!(matches!(
            session.apply(AdminState::Disable),
            Err(SessionError::NoSelection)
        ));
        session.select(0).unwrap();
        assert!(matches!(
            session.apply(AdminState::Enable),
            Err(SessionError::Unavailable(Action::Enable))
        ));
    }

    #[test]
    fn keep_status_on_failure() {
        let mut mock = control();
        mock.expect_set_admin_state().times(1).returning(|_, _| {
            Err(NicError::ExecutableNotFound {
                program: "netsh".into(),
            })
        });
        let mut session = Session::new(&mock, true);
        session.refresh().unwrap();
        session.select(0).unwrap();
        match session.apply(AdminState::Disable) {
            Err(SessionError::Adapter(e)) => assert_eq!(e.kind(), ErrorKind::ExecutableNotFound),
            other => panic!("Unexpected result {:?}", other),
        }
        assert_eq!(session.status_line(), "Failed to disable 'Ethernet'.");
    }

    #[test]
    fn empty_list_when_listing_fails() {
        let mut first = true;
        let mut mock = MockAdapterControl::new();
        mock.expect_list_adapters().returning(move || {
            if first {
                first = false;
                Ok(listing())
            } else {
                Err(NicError::ParseFormat)
            }
        });
        let mut session = Session::new(&mock, true);
        session.refresh().unwrap();
        assert_eq!(session.adapters().len(), 3);
        assert!(session.refresh().is_err());
        assert!(session.adapters().is_empty());
        assert_eq!(session.status_line(), "Failed to load the adapter list!");
    }
}
