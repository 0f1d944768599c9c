/// A modal thing the pet can be asked to do from the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activity {
    pub id: &'static str,
    pub start_label: &'static str,
    pub stop_label: &'static str,
    /// Animation root; `/loop` and `/loopOut` hang off it.
    pub prefix: &'static str,
}

const ALL_ACTIVITIES: [Activity; 3] = [
    Activity {
        id: "sleep",
        start_label: "Go to sleep",
        stop_label: "Wake up",
        prefix: "menuTriggered/sleep",
    },
    Activity {
        id: "study",
        start_label: "Study",
        stop_label: "Stop studying",
        prefix: "menuTriggered/study",
    },
    Activity {
        id: "game",
        start_label: "Play a game",
        stop_label: "Stop playing",
        prefix: "menuTriggered/game",
    },
];

/// Fixed table of activities offered in the menu.
#[derive(Debug, Clone, Copy)]
pub struct ActivityRegistry {
    entries: &'static [Activity],
}

impl ActivityRegistry {
    pub fn builtin() -> Self {
        Self {
            entries: &ALL_ACTIVITIES,
        }
    }

    pub fn find(&self, id: &str) -> Option<&'static Activity> {
        self.entries.iter().find(|a| a.id == id)
    }

    pub fn all(&self) -> &'static [Activity] {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_id() {
        let reg = ActivityRegistry::builtin();
        let sleep = reg.find("sleep").unwrap();
        assert_eq!(sleep.prefix, "menuTriggered/sleep");
        assert!(reg.find("juggle").is_none());
    }

    #[test]
    fn ids_are_unique() {
        let reg = ActivityRegistry::builtin();
        for (i, a) in reg.all().iter().enumerate() {
            assert!(reg.all()[i + 1..].iter().all(|b| b.id != a.id));
        }
    }
}
