//! Static curriculum data the service reads but never changes.

use crate::models::AgeTier;

pub struct Habit {
    pub id: u8,
    pub title: &'static str,
    pub tagline: &'static str,
}

pub const HABITS: [Habit; 7] = [
    Habit { id: 1, title: "Be Proactive", tagline: "You're in Charge!" },
    Habit { id: 2, title: "Begin with the End in Mind", tagline: "Have a Plan" },
    Habit { id: 3, title: "Put First Things First", tagline: "Work First, Then Play" },
    Habit { id: 4, title: "Think Win-Win", tagline: "Everyone Can Win" },
    Habit {
        id: 5,
        title: "Seek First to Understand, Then to Be Understood",
        tagline: "Listen Before You Talk",
    },
    Habit { id: 6, title: "Synergize", tagline: "Together Is Better" },
    Habit { id: 7, title: "Sharpen the Saw", tagline: "Balance Feels Best" },
];

/// The habit list shown to `tier`. All tiers share one list for now.
pub fn habits(tier: AgeTier) -> &'static [Habit] {
    match tier {
        AgeTier::Kids | AgeTier::Teens | AgeTier::Adults => &HABITS,
    }
}

pub fn habit(tier: AgeTier, id: u8) -> Option<&'static Habit> {
    habits(tier).iter().find(|habit| habit.id == id)
}

/// A starter planner item, placed `day_offset` days after the Sunday that
/// opens the current week.
pub struct SampleActivity {
    pub day_offset: u64,
    pub time: &'static str,
    pub activity: &'static str,
}

/// What a planner scope starts with before anything was ever saved to it.
pub fn sample_activities(tier: AgeTier) -> &'static [SampleActivity] {
    match tier {
        AgeTier::Kids => &[
            SampleActivity {
                day_offset: 1,
                time: "15:30",
                activity: "Practice being proactive by cleaning my room without being asked",
            },
            SampleActivity {
                day_offset: 3,
                time: "16:00",
                activity: "Make a goal chart for the week",
            },
            SampleActivity {
                day_offset: 6,
                time: "10:00",
                activity: "Family activity: practice listening to each other",
            },
        ],
        AgeTier::Teens => &[
            SampleActivity {
                day_offset: 1,
                time: "16:00",
                activity: "Study session with focus on most important subjects first",
            },
            SampleActivity {
                day_offset: 4,
                time: "17:30",
                activity: "Practice active listening with a friend",
            },
            SampleActivity {
                day_offset: 6,
                time: "09:00",
                activity: "Work on personal mission statement",
            },
        ],
        AgeTier::Adults => &[
            SampleActivity {
                day_offset: 1,
                time: "07:30",
                activity: "Morning planning session for the week",
            },
            SampleActivity {
                day_offset: 3,
                time: "12:00",
                activity: "Lunch meeting focusing on win-win solutions",
            },
            SampleActivity {
                day_offset: 5,
                time: "17:00",
                activity: "Review weekly accomplishments and plan for improvement",
            },
        ],
    }
}

pub fn mission_prompts(tier: AgeTier) -> &'static [&'static str] {
    match tier {
        AgeTier::Kids => &[
            "I want to be someone who...",
            "The most important things to me are...",
            "I want to help others by...",
            "When I grow up, I want to be...",
            "My special talents are...",
        ],
        AgeTier::Teens => &[
            "What I stand for is...",
            "The values most important to me are...",
            "I make a difference by...",
            "My goals for the future include...",
            "The person I want to become is...",
        ],
        AgeTier::Adults => &[
            "My core purpose in life is to...",
            "The principles that guide my decisions are...",
            "I contribute value by...",
            "My most important roles in life are...",
            "The legacy I want to leave is...",
        ],
    }
}
