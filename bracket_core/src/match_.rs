// match of a tournament stage

use crate::Id;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a match. The variants are totally ordered; the
/// progression engine never moves a match backwards except through an
/// explicit reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// neither opponent slot is resolved yet
    Locked,
    /// exactly one opponent slot is resolved, the other waits on upstream
    Waiting,
    /// both opponent slots are resolved, nothing recorded yet
    Ready,
    /// at least one score recorded, no result yet
    Running,
    /// a result is recorded, or the match was decided by BYE
    Completed,
    /// terminal; refuses every update
    Archived,
}

/// One of the two sides of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    One,
    Two,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::One => Side::Two,
            Side::Two => Side::One,
        }
    }
}

/// Recorded outcome of one side of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SideResult {
    Win,
    Draw,
    Loss,
}

/// A participant occupying a slot, together with everything recorded for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideEntry {
    pub participant_id: Id,
    pub score: Option<u16>,
    pub result: Option<SideResult>,
    /// forfeit dominates progression; a score recorded alongside it is kept
    /// for display only
    pub forfeit: bool,
}

impl SideEntry {
    pub fn new(participant_id: Id) -> Self {
        SideEntry {
            participant_id,
            score: None,
            result: None,
            forfeit: false,
        }
    }
}

/// An opponent slot of a match.
///
/// `Position` carries the seed position for first-round and pending-seeding
/// slots, and the feeding match number for slots filled by an earlier match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// absent opponent, causes automatic advancement of the other side
    Bye,
    /// unresolved reference to a future participant
    Position(u32),
    /// resolved participant
    Entry(SideEntry),
}

impl Slot {
    pub fn entry(&self) -> Option<&SideEntry> {
        match self {
            Slot::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn entry_mut(&mut self) -> Option<&mut SideEntry> {
        match self {
            Slot::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn participant_id(&self) -> Option<Id> {
        self.entry().map(|e| e.participant_id)
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, Slot::Bye)
    }

    pub fn is_position(&self) -> bool {
        matches!(self, Slot::Position(_))
    }

    /// A slot is resolved once it no longer waits on upstream: it holds a
    /// participant or is a definitive BYE.
    pub fn is_resolved(&self) -> bool {
        !self.is_position()
    }

    /// Strip everything recorded on the slot, keeping the participant.
    pub fn cleared(&self) -> Slot {
        match self {
            Slot::Entry(entry) => Slot::Entry(SideEntry::new(entry.participant_id)),
            other => *other,
        }
    }
}

/// Match of a stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// id of match, assigned by storage on insert
    pub id: Id,
    /// id of stage
    pub stage_id: Id,
    /// id of group
    pub group_id: Id,
    /// id of round
    pub round_id: Id,
    /// match number within the round
    pub number: u32,
    pub status: Status,
    /// number of child games of the best-of series, `0` for a plain match
    pub child_count: u16,
    pub opponent1: Slot,
    pub opponent2: Slot,
}

impl Match {
    pub fn slot(&self, side: Side) -> &Slot {
        match side {
            Side::One => &self.opponent1,
            Side::Two => &self.opponent2,
        }
    }

    pub fn slot_mut(&mut self, side: Side) -> &mut Slot {
        match side {
            Side::One => &mut self.opponent1,
            Side::Two => &mut self.opponent2,
        }
    }

    /// Side on which the given participant sits, if any.
    pub fn side_of(&self, participant_id: Id) -> Option<Side> {
        if self.opponent1.participant_id() == Some(participant_id) {
            Some(Side::One)
        } else if self.opponent2.participant_id() == Some(participant_id) {
            Some(Side::Two)
        } else {
            None
        }
    }

    /// Winning side of a completed match. `None` for draws, double forfeits
    /// and double-BYE matches.
    pub fn winner_side(&self) -> Option<Side> {
        let (e1, e2) = (self.opponent1.entry(), self.opponent2.entry());
        match (e1, e2) {
            (Some(a), Some(b)) => {
                if a.forfeit && b.forfeit {
                    None
                } else if a.forfeit {
                    Some(Side::Two)
                } else if b.forfeit {
                    Some(Side::One)
                } else if a.result == Some(SideResult::Win) {
                    Some(Side::One)
                } else if b.result == Some(SideResult::Win) {
                    Some(Side::Two)
                } else {
                    None
                }
            }
            // a participant facing a BYE advances
            (Some(_), None) if self.opponent2.is_bye() => Some(Side::One),
            (None, Some(_)) if self.opponent1.is_bye() => Some(Side::Two),
            _ => None,
        }
    }

    pub fn winner_id(&self) -> Option<Id> {
        self.winner_side()
            .and_then(|side| self.slot(side).participant_id())
    }

    pub fn loser_id(&self) -> Option<Id> {
        self.winner_side()
            .and_then(|side| self.slot(side.opposite()).participant_id())
    }

    /// True when the match was decided by an absent opponent rather than by
    /// recorded play. Such completions are derived state and are undone
    /// implicitly when upstream is reset.
    pub fn is_bye_decided(&self) -> bool {
        self.status >= Status::Completed && (self.opponent1.is_bye() || self.opponent2.is_bye())
    }

    /// True once any score, result or forfeit is recorded on either side.
    pub fn has_recorded_play(&self) -> bool {
        [&self.opponent1, &self.opponent2].iter().any(|slot| {
            slot.entry()
                .is_some_and(|e| e.score.is_some() || e.result.is_some() || e.forfeit)
        })
    }
}

/// Child game of a best-of series. Shares the opponent shape of a match but
/// never holds position placeholders: an undetermined side is a BYE-shaped
/// hole until the parent slot resolves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchGame {
    /// id of match game, assigned by storage on insert
    pub id: Id,
    /// id of stage
    pub stage_id: Id,
    /// id of parent match
    pub parent_id: Id,
    /// game number within the series, `1..=child_count`
    pub number: u32,
    pub status: Status,
    pub opponent1: Slot,
    pub opponent2: Slot,
}

impl MatchGame {
    pub fn slot(&self, side: Side) -> &Slot {
        match side {
            Side::One => &self.opponent1,
            Side::Two => &self.opponent2,
        }
    }

    pub fn slot_mut(&mut self, side: Side) -> &mut Slot {
        match side {
            Side::One => &mut self.opponent1,
            Side::Two => &mut self.opponent2,
        }
    }

    pub fn winner_side(&self) -> Option<Side> {
        let (e1, e2) = (self.opponent1.entry(), self.opponent2.entry());
        match (e1, e2) {
            (Some(a), Some(b)) => {
                if a.forfeit && b.forfeit {
                    None
                } else if a.forfeit {
                    Some(Side::Two)
                } else if b.forfeit {
                    Some(Side::One)
                } else if a.result == Some(SideResult::Win) {
                    Some(Side::One)
                } else if b.result == Some(SideResult::Win) {
                    Some(Side::Two)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// Partial update of one side of a match or match game. Absent fields keep
/// their stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SideUpdate {
    /// must match the participant currently occupying the slot when given
    pub participant_id: Option<Id>,
    /// validated to the storable range; negative values are rejected
    pub score: Option<i32>,
    pub result: Option<SideResult>,
    pub forfeit: Option<bool>,
}

impl SideUpdate {
    pub fn score(score: i32) -> Self {
        SideUpdate {
            score: Some(score),
            ..Default::default()
        }
    }

    pub fn result(result: SideResult) -> Self {
        SideUpdate {
            result: Some(result),
            ..Default::default()
        }
    }

    pub fn win() -> Self {
        Self::result(SideResult::Win)
    }

    pub fn forfeit() -> Self {
        SideUpdate {
            forfeit: Some(true),
            ..Default::default()
        }
    }
}

/// Partial update of a match, entry point of the progression engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchUpdate {
    pub opponent1: Option<SideUpdate>,
    pub opponent2: Option<SideUpdate>,
}

impl MatchUpdate {
    pub fn sides(opponent1: SideUpdate, opponent2: SideUpdate) -> Self {
        MatchUpdate {
            opponent1: Some(opponent1),
            opponent2: Some(opponent2),
        }
    }
}
