use serde::Serialize;

// --- Category / Rarity ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Chores,
    Learning,
    Investing,
    Saving,
    Special,
    Bitcoin,
    Games,
}

/// Presentation weighting only; never consulted by unlock logic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Legendary,
}

// --- Static Definitions ---

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Reward {
    pub xp: u32,
    pub coins: u32,
    pub special: Option<&'static str>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Celebration {
    pub animation: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct AchievementDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: AchievementCategory,
    pub requirement: u32,
    pub rarity: Rarity,
    pub reward: Reward,
    pub celebration: Celebration,
}

// Ids the engine evaluates directly.
pub const FIRST_CHORE: &str = "first_chore";
pub const CHORE_10: &str = "chore_champion_10";
pub const CHORE_50: &str = "chore_legend_50";
pub const CHORE_STREAK_3: &str = "chore_streak_3";
pub const CHORE_STREAK_7: &str = "chore_streak_7";
pub const CHORE_STREAK_30: &str = "chore_streak_30";
pub const FIRST_LESSON: &str = "first_lesson";
pub const LESSON_10: &str = "bookworm_10";
pub const LESSON_25: &str = "scholar_25";
pub const LEARNING_STREAK_3: &str = "learning_streak_3";
pub const LEARNING_STREAK_7: &str = "learning_streak_7";
pub const FIRST_INVESTMENT: &str = "first_investment";
pub const INVESTOR_10: &str = "investor_10";
pub const PROFITABLE_TRADE: &str = "profitable_trade";
pub const MARKET_MASTER: &str = "market_master";
pub const SAVER_50: &str = "saver_50";
pub const SAVER_100: &str = "saver_100";
pub const EARLY_BIRD: &str = "early_bird";
pub const NIGHT_OWL: &str = "night_owl";
pub const PERFECT_DAY: &str = "perfect_day";
pub const LEVEL_5: &str = "level_5";
pub const LEVEL_10: &str = "level_10";
pub const SATOSHI_SCHOLAR: &str = "satoshi_scholar";
pub const QUIZ_CHAMPION: &str = "quiz_champion";

pub const CHORE_COUNT_MILESTONES: &[&str] = &[FIRST_CHORE, CHORE_10, CHORE_50];
pub const CHORE_STREAK_MILESTONES: &[&str] = &[CHORE_STREAK_3, CHORE_STREAK_7, CHORE_STREAK_30];
pub const LESSON_COUNT_MILESTONES: &[&str] = &[FIRST_LESSON, LESSON_10, LESSON_25];
pub const LEARNING_STREAK_MILESTONES: &[&str] = &[LEARNING_STREAK_3, LEARNING_STREAK_7];
pub const SAVING_MILESTONES: &[&str] = &[SAVER_50, SAVER_100];
pub const LEVEL_MILESTONES: &[&str] = &[LEVEL_5, LEVEL_10];

const fn reward(xp: u32, coins: u32) -> Reward {
    Reward {
        xp,
        coins,
        special: None,
    }
}

pub static ACHIEVEMENTS: &[AchievementDefinition] = &[
    // Chores
    AchievementDefinition {
        id: FIRST_CHORE,
        title: "First Chore",
        description: "Complete your very first chore",
        icon: "🧹",
        category: AchievementCategory::Chores,
        requirement: 1,
        rarity: Rarity::Bronze,
        reward: reward(25, 5),
        celebration: Celebration {
            animation: "confetti",
            message: "You did your first chore! Every coin counts!",
        },
    },
    AchievementDefinition {
        id: CHORE_10,
        title: "Chore Champion",
        description: "Complete 10 chores",
        icon: "🏅",
        category: AchievementCategory::Chores,
        requirement: 10,
        rarity: Rarity::Silver,
        reward: reward(50, 10),
        celebration: Celebration {
            animation: "medal",
            message: "Ten chores done! You're a real helper!",
        },
    },
    AchievementDefinition {
        id: CHORE_50,
        title: "Chore Legend",
        description: "Complete 50 chores",
        icon: "👑",
        category: AchievementCategory::Chores,
        requirement: 50,
        rarity: Rarity::Gold,
        reward: reward(150, 25),
        celebration: Celebration {
            animation: "crown",
            message: "Fifty chores! The house has never looked better!",
        },
    },
    AchievementDefinition {
        id: CHORE_STREAK_3,
        title: "On a Roll",
        description: "Do chores 3 days in a row",
        icon: "🔥",
        category: AchievementCategory::Chores,
        requirement: 3,
        rarity: Rarity::Bronze,
        reward: reward(30, 5),
        celebration: Celebration {
            animation: "flame",
            message: "Three days in a row! Keep that fire going!",
        },
    },
    AchievementDefinition {
        id: CHORE_STREAK_7,
        title: "Week Warrior",
        description: "Do chores 7 days in a row",
        icon: "📅",
        category: AchievementCategory::Chores,
        requirement: 7,
        rarity: Rarity::Silver,
        reward: reward(75, 15),
        celebration: Celebration {
            animation: "flame",
            message: "A whole week of chores! Amazing!",
        },
    },
    AchievementDefinition {
        id: CHORE_STREAK_30,
        title: "Habit Hero",
        description: "Do chores 30 days in a row",
        icon: "🦸",
        category: AchievementCategory::Chores,
        requirement: 30,
        rarity: Rarity::Platinum,
        reward: Reward {
            xp: 300,
            coins: 50,
            special: Some("hero_badge"),
        },
        celebration: Celebration {
            animation: "fireworks",
            message: "Thirty days straight! You're a Habit Hero!",
        },
    },
    // Learning
    AchievementDefinition {
        id: FIRST_LESSON,
        title: "Curious Mind",
        description: "Finish your first money lesson",
        icon: "📘",
        category: AchievementCategory::Learning,
        requirement: 1,
        rarity: Rarity::Bronze,
        reward: reward(25, 5),
        celebration: Celebration {
            animation: "sparkles",
            message: "Your first lesson is done! Knowledge is treasure!",
        },
    },
    AchievementDefinition {
        id: LESSON_10,
        title: "Bookworm",
        description: "Finish 10 lessons",
        icon: "🐛",
        category: AchievementCategory::Learning,
        requirement: 10,
        rarity: Rarity::Silver,
        reward: reward(60, 10),
        celebration: Celebration {
            animation: "sparkles",
            message: "Ten lessons! Your brain is growing!",
        },
    },
    AchievementDefinition {
        id: LESSON_25,
        title: "Money Scholar",
        description: "Finish 25 lessons",
        icon: "🎓",
        category: AchievementCategory::Learning,
        requirement: 25,
        rarity: Rarity::Gold,
        reward: reward(150, 25),
        celebration: Celebration {
            animation: "graduation",
            message: "Twenty-five lessons! You're a Money Scholar!",
        },
    },
    AchievementDefinition {
        id: LEARNING_STREAK_3,
        title: "Study Buddy",
        description: "Learn 3 days in a row",
        icon: "📚",
        category: AchievementCategory::Learning,
        requirement: 3,
        rarity: Rarity::Bronze,
        reward: reward(30, 5),
        celebration: Celebration {
            animation: "flame",
            message: "Three days of learning in a row!",
        },
    },
    AchievementDefinition {
        id: LEARNING_STREAK_7,
        title: "Brain Builder",
        description: "Learn 7 days in a row",
        icon: "🧠",
        category: AchievementCategory::Learning,
        requirement: 7,
        rarity: Rarity::Gold,
        reward: reward(100, 20),
        celebration: Celebration {
            animation: "fireworks",
            message: "A full week of learning! Incredible!",
        },
    },
    // Investing
    AchievementDefinition {
        id: FIRST_INVESTMENT,
        title: "First Investment",
        description: "Make your first investment in the market simulator",
        icon: "📈",
        category: AchievementCategory::Investing,
        requirement: 1,
        rarity: Rarity::Bronze,
        reward: reward(30, 5),
        celebration: Celebration {
            animation: "chart",
            message: "You made your first investment! Watch it grow!",
        },
    },
    AchievementDefinition {
        id: INVESTOR_10,
        title: "Portfolio Builder",
        description: "Make 10 investments",
        icon: "💼",
        category: AchievementCategory::Investing,
        requirement: 10,
        rarity: Rarity::Silver,
        reward: reward(75, 15),
        celebration: Celebration {
            animation: "chart",
            message: "Ten investments! You're building a portfolio!",
        },
    },
    AchievementDefinition {
        id: PROFITABLE_TRADE,
        title: "Smart Trader",
        description: "Make a profitable trade",
        icon: "💹",
        category: AchievementCategory::Investing,
        requirement: 1,
        rarity: Rarity::Silver,
        reward: reward(50, 10),
        celebration: Celebration {
            animation: "coins",
            message: "You sold for a profit! Smart move!",
        },
    },
    AchievementDefinition {
        id: MARKET_MASTER,
        title: "Market Master",
        description: "Make 10 profitable trades",
        icon: "🐂",
        category: AchievementCategory::Investing,
        requirement: 10,
        rarity: Rarity::Platinum,
        reward: Reward {
            xp: 250,
            coins: 50,
            special: Some("golden_bull"),
        },
        celebration: Celebration {
            animation: "fireworks",
            message: "Ten winning trades! You're a Market Master!",
        },
    },
    // Saving
    AchievementDefinition {
        id: SAVER_50,
        title: "Piggy Bank",
        description: "Earn 50 coins in total",
        icon: "🐷",
        category: AchievementCategory::Saving,
        requirement: 50,
        rarity: Rarity::Bronze,
        reward: reward(40, 0),
        celebration: Celebration {
            animation: "coins",
            message: "Fifty coins saved! Your piggy bank is happy!",
        },
    },
    AchievementDefinition {
        id: SAVER_100,
        title: "Super Saver",
        description: "Earn 100 coins in total",
        icon: "💰",
        category: AchievementCategory::Saving,
        requirement: 100,
        rarity: Rarity::Silver,
        reward: reward(80, 0),
        celebration: Celebration {
            animation: "coins",
            message: "One hundred coins! You're a Super Saver!",
        },
    },
    // Special
    AchievementDefinition {
        id: EARLY_BIRD,
        title: "Early Bird",
        description: "Complete a task before 8 AM",
        icon: "🐦",
        category: AchievementCategory::Special,
        requirement: 1,
        rarity: Rarity::Silver,
        reward: reward(40, 5),
        celebration: Celebration {
            animation: "sunrise",
            message: "Up with the sun! The early bird gets the coin!",
        },
    },
    AchievementDefinition {
        id: NIGHT_OWL,
        title: "Night Owl",
        description: "Complete a task after 8 PM",
        icon: "🦉",
        category: AchievementCategory::Special,
        requirement: 1,
        rarity: Rarity::Silver,
        reward: reward(40, 5),
        celebration: Celebration {
            animation: "moon",
            message: "Working late! Hoo-hoo!",
        },
    },
    AchievementDefinition {
        id: PERFECT_DAY,
        title: "Perfect Day",
        description: "Do a chore and a lesson on the same day",
        icon: "🌟",
        category: AchievementCategory::Special,
        requirement: 1,
        rarity: Rarity::Gold,
        reward: reward(75, 15),
        celebration: Celebration {
            animation: "stars",
            message: "Chores and learning in one day! Perfect!",
        },
    },
    AchievementDefinition {
        id: LEVEL_5,
        title: "Rising Star",
        description: "Reach level 5",
        icon: "⭐",
        category: AchievementCategory::Special,
        requirement: 5,
        rarity: Rarity::Gold,
        reward: reward(100, 20),
        celebration: Celebration {
            animation: "stars",
            message: "Level 5! You're a Rising Star!",
        },
    },
    AchievementDefinition {
        id: LEVEL_10,
        title: "Money Master",
        description: "Reach level 10",
        icon: "🏆",
        category: AchievementCategory::Special,
        requirement: 10,
        rarity: Rarity::Legendary,
        reward: Reward {
            xp: 250,
            coins: 50,
            special: Some("master_crown"),
        },
        celebration: Celebration {
            animation: "fireworks",
            message: "Level 10! You're a true Money Master!",
        },
    },
    // Bitcoin
    AchievementDefinition {
        id: SATOSHI_SCHOLAR,
        title: "Satoshi Scholar",
        description: "Answer 10 bitcoin quiz questions correctly",
        icon: "₿",
        category: AchievementCategory::Bitcoin,
        requirement: 10,
        rarity: Rarity::Gold,
        reward: reward(100, 21),
        celebration: Celebration {
            animation: "orange_glow",
            message: "Ten right answers! You understand sound money!",
        },
    },
    // Games
    AchievementDefinition {
        id: QUIZ_CHAMPION,
        title: "Quiz Champion",
        description: "Answer 25 quiz questions correctly",
        icon: "🎮",
        category: AchievementCategory::Games,
        requirement: 25,
        rarity: Rarity::Platinum,
        reward: reward(200, 30),
        celebration: Celebration {
            animation: "trophy",
            message: "",
        },
    },
];

pub fn find_definition(id: &str) -> Option<&'static AchievementDefinition> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}
