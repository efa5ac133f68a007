use crate::config::Config;
use crate::core::gamification::levels::LevelTable;
use crate::core::types::GamificationState;

pub fn render_status(config: &Config, levels: &LevelTable, state: &GamificationState) -> String {
    let next = match levels.xp_to_next(state.total_xp) {
        Some(xp) => format!("{xp} XP to level {}", state.level + 1),
        None => "max level".to_string(),
    };
    let last = state
        .last_activity_date
        .map_or_else(|| "never".to_string(), |d| d.to_string());

    [
        format!("◆ nextup {}", env!("CARGO_PKG_VERSION")),
        String::new(),
        format!("  user       {}", state.user_id),
        format!("  level      {}/{} ({next})", state.level, levels.max_level()),
        format!("  total xp   {}", state.total_xp),
        format!(
            "  streak     {} (longest {})",
            state.current_streak, state.longest_streak
        ),
        format!("  last seen  {last}"),
        String::new(),
        format!(
            "  storage    {} ({})",
            config.storage.backend,
            config.storage.resolved_path().display()
        ),
        format!("  backend    {}", config.generation.backend),
    ]
    .join("\n")
}
