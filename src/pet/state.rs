/// What the pet is doing. Exactly one is current at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AnimationState {
    Startup,
    Idle,
    AutoTriggered,
    ClickTriggered,
    DragTriggered,
    DragLoop,
    DragEnd,
    RightDragTriggered,
    RightDragLoop,
    RightDragEnd,
    ActivityStart,
    ActivityLoop,
    ActivityEnd,
    MusicTriggered,
    MusicLoop,
    MusicEnd,
    MoveHorizontalLeftToRight,
    MoveHorizontalRightToLeft,
    MoveVerticalBottomToTop,
    MoveVerticalTopToBottom,
    MoveTopSwing,
    MoveLoop,
    MoveEnd,
    Shutdown,
}

/// Start, loop or wind-down clip hanging off a path prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Start,
    Loop,
    End,
}

impl Phase {
    pub fn apply(self, prefix: &str) -> String {
        match self {
            Phase::Start => prefix.to_string(),
            Phase::Loop => format!("{prefix}/loop"),
            Phase::End => format!("{prefix}/loopOut"),
        }
    }
}

/// How a state finds its animation path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRule {
    Literal(&'static str),
    /// Chosen by whoever enters the state; the fallback is used otherwise.
    Given(&'static str),
    /// Random pick from the idle animation set unless one is given.
    AutoPick,
    /// Current activity prefix.
    Activity(Phase),
    /// Current move session prefix.
    Move(Phase),
}

/// Where a one-shot clip goes when it runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    /// Looping state; never completes on its own.
    Stay,
    State(AnimationState),
    /// `MoveLoop` when the clip was a movement path, `Idle` otherwise.
    IdleOrMoveLoop,
    Terminate,
}

pub struct StateSpec {
    pub state: AnimationState,
    pub path: PathRule,
    pub looping: bool,
    pub next: Next,
}

const fn one_shot(state: AnimationState, path: PathRule, next: Next) -> StateSpec {
    StateSpec {
        state,
        path,
        looping: false,
        next,
    }
}

const fn looping(state: AnimationState, path: PathRule) -> StateSpec {
    StateSpec {
        state,
        path,
        looping: true,
        next: Next::Stay,
    }
}

use AnimationState as S;

/// Transition table, indexed by `AnimationState as usize`.
const TABLE: [StateSpec; 24] = [
    one_shot(S::Startup, PathRule::Literal("startup"), Next::State(S::Idle)),
    looping(S::Idle, PathRule::Literal("idle")),
    one_shot(S::AutoTriggered, PathRule::AutoPick, Next::IdleOrMoveLoop),
    one_shot(
        S::ClickTriggered,
        PathRule::Given("clickTriggered/click_HEAD"),
        Next::State(S::Idle),
    ),
    one_shot(
        S::DragTriggered,
        PathRule::Literal("dragTriggered"),
        Next::State(S::DragLoop),
    ),
    looping(S::DragLoop, PathRule::Literal("dragTriggered/loop")),
    one_shot(
        S::DragEnd,
        PathRule::Literal("dragTriggered/loopOut"),
        Next::State(S::Idle),
    ),
    one_shot(
        S::RightDragTriggered,
        PathRule::Literal("rightDragTriggered"),
        Next::State(S::RightDragLoop),
    ),
    looping(S::RightDragLoop, PathRule::Literal("rightDragTriggered/loop")),
    one_shot(
        S::RightDragEnd,
        PathRule::Literal("rightDragTriggered/loopOut"),
        Next::State(S::Idle),
    ),
    one_shot(
        S::ActivityStart,
        PathRule::Activity(Phase::Start),
        Next::State(S::ActivityLoop),
    ),
    looping(S::ActivityLoop, PathRule::Activity(Phase::Loop)),
    one_shot(
        S::ActivityEnd,
        PathRule::Activity(Phase::End),
        Next::State(S::Idle),
    ),
    one_shot(
        S::MusicTriggered,
        PathRule::Literal("musicTriggered"),
        Next::State(S::MusicLoop),
    ),
    looping(S::MusicLoop, PathRule::Literal("musicTriggered/loop")),
    one_shot(
        S::MusicEnd,
        PathRule::Literal("musicTriggered/loopOut"),
        Next::State(S::Idle),
    ),
    one_shot(
        S::MoveHorizontalLeftToRight,
        PathRule::Move(Phase::Start),
        Next::State(S::MoveLoop),
    ),
    one_shot(
        S::MoveHorizontalRightToLeft,
        PathRule::Move(Phase::Start),
        Next::State(S::MoveLoop),
    ),
    one_shot(
        S::MoveVerticalBottomToTop,
        PathRule::Move(Phase::Start),
        Next::State(S::MoveLoop),
    ),
    one_shot(
        S::MoveVerticalTopToBottom,
        PathRule::Move(Phase::Start),
        Next::State(S::MoveLoop),
    ),
    one_shot(
        S::MoveTopSwing,
        PathRule::Move(Phase::Start),
        Next::State(S::MoveLoop),
    ),
    looping(S::MoveLoop, PathRule::Move(Phase::Loop)),
    one_shot(S::MoveEnd, PathRule::Move(Phase::End), Next::State(S::Idle)),
    one_shot(S::Shutdown, PathRule::Literal("shutdown"), Next::Terminate),
];

impl AnimationState {
    #[cfg(test)]
    pub const ALL: [AnimationState; 24] = [
        S::Startup,
        S::Idle,
        S::AutoTriggered,
        S::ClickTriggered,
        S::DragTriggered,
        S::DragLoop,
        S::DragEnd,
        S::RightDragTriggered,
        S::RightDragLoop,
        S::RightDragEnd,
        S::ActivityStart,
        S::ActivityLoop,
        S::ActivityEnd,
        S::MusicTriggered,
        S::MusicLoop,
        S::MusicEnd,
        S::MoveHorizontalLeftToRight,
        S::MoveHorizontalRightToLeft,
        S::MoveVerticalBottomToTop,
        S::MoveVerticalTopToBottom,
        S::MoveTopSwing,
        S::MoveLoop,
        S::MoveEnd,
        S::Shutdown,
    ];

    pub fn spec(self) -> &'static StateSpec {
        let spec = &TABLE[self as usize];
        debug_assert_eq!(spec.state, self, "transition table out of order");
        spec
    }

    #[cfg(test)]
    pub fn is_looping(self) -> bool {
        self.spec().looping
    }

    pub fn is_music(self) -> bool {
        matches!(self, S::MusicTriggered | S::MusicLoop | S::MusicEnd)
    }

    #[cfg(test)]
    pub fn is_activity(self) -> bool {
        matches!(self, S::ActivityStart | S::ActivityLoop | S::ActivityEnd)
    }

    /// Movement start clips, the move loop and its wind-down.
    pub fn is_move(self) -> bool {
        matches!(self.spec().path, PathRule::Move(_))
    }
}

/// Stationary idle animations picked by the idle trigger.
pub const AUTO_TRIGGERED: [&str; 4] = [
    "autoTriggered/meow",
    "autoTriggered/stretch",
    "autoTriggered/yawn",
    "autoTriggered/lookAround",
];

pub const CLICK_HEAD: &str = "clickTriggered/click_HEAD";

pub const CLICK_BODY: [&str; 3] = [
    "clickTriggered/click_BODY/0",
    "clickTriggered/click_BODY/1",
    "clickTriggered/click_BODY/2",
];

/// Fixed single-frame previews shown the moment a drag starts.
pub const DRAG_PREVIEW: &str = "dragTriggered";
pub const RIGHT_DRAG_PREVIEW: &str = "rightDragTriggered";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_state() {
        for (i, state) in AnimationState::ALL.iter().enumerate() {
            assert_eq!(*state as usize, i);
            assert_eq!(TABLE[i].state, *state);
        }
    }

    #[test]
    fn only_idle_and_loops_repeat() {
        let looping: Vec<_> = AnimationState::ALL
            .iter()
            .copied()
            .filter(|s| s.is_looping())
            .collect();
        assert_eq!(
            looping,
            vec![
                S::Idle,
                S::DragLoop,
                S::RightDragLoop,
                S::ActivityLoop,
                S::MusicLoop,
                S::MoveLoop
            ]
        );
    }

    #[test]
    fn one_shots_always_have_somewhere_to_go() {
        for state in AnimationState::ALL {
            let spec = state.spec();
            assert_eq!(spec.looping, spec.next == Next::Stay, "{state:?}");
        }
    }

    #[test]
    fn natural_completions() {
        let expect = [
            (S::Startup, Next::State(S::Idle)),
            (S::AutoTriggered, Next::IdleOrMoveLoop),
            (S::ClickTriggered, Next::State(S::Idle)),
            (S::DragEnd, Next::State(S::Idle)),
            (S::RightDragEnd, Next::State(S::Idle)),
            (S::ActivityStart, Next::State(S::ActivityLoop)),
            (S::ActivityEnd, Next::State(S::Idle)),
            (S::MusicTriggered, Next::State(S::MusicLoop)),
            (S::MusicEnd, Next::State(S::Idle)),
            (S::MoveHorizontalLeftToRight, Next::State(S::MoveLoop)),
            (S::MoveTopSwing, Next::State(S::MoveLoop)),
            (S::MoveEnd, Next::State(S::Idle)),
            (S::Shutdown, Next::Terminate),
        ];
        for (state, next) in expect {
            assert_eq!(state.spec().next, next, "{state:?}");
        }
    }

    #[test]
    fn phase_suffixes() {
        assert_eq!(Phase::Start.apply("menuTriggered/sleep"), "menuTriggered/sleep");
        assert_eq!(Phase::Loop.apply("menuTriggered/sleep"), "menuTriggered/sleep/loop");
        assert_eq!(Phase::End.apply("menuTriggered/sleep"), "menuTriggered/sleep/loopOut");
    }
}
