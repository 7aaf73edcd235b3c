use crate::content::habit;
use crate::models::{AgeTier, ScopeKey, StreakSummary};
use chrono::NaiveDate;

pub fn render_index(today: NaiveDate, rows: &[(ScopeKey, StreakSummary)]) -> String {
    let tiers: String = AgeTier::ALL
        .into_iter()
        .map(|tier| render_tier(tier, today, rows))
        .collect();

    INDEX_HTML
        .replace("{{DATE}}", &today.format("%A, %B %-d, %Y").to_string())
        .replace("{{TIERS}}", &tiers)
}

fn render_tier(tier: AgeTier, today: NaiveDate, rows: &[(ScopeKey, StreakSummary)]) -> String {
    let habits: String = rows
        .iter()
        .filter(|(scope, _)| scope.tier() == tier)
        .map(|(scope, streaks)| {
            let (title, tagline) = habit(tier, scope.habit())
                .map(|h| (h.title, h.tagline))
                .unwrap_or(("General", ""));
            format!(
                r#"<li>
          <span class="habit" title="{tagline}">{id}. {title}</span>
          <span class="streak" title="current / best">{current} / {best}</span>
          <button class="done" data-path="/api/{tier}/{id}/tracker/{today}/toggle">Done today</button>
        </li>"#,
                id = scope.habit(),
                current = streaks.current,
                best = streaks.best,
            )
        })
        .collect();

    format!(
        r#"<section class="tier {tier}">
      <h2>{label}</h2>
      <ul>
        {habits}
      </ul>
    </section>"#,
        label = tier_label(tier),
    )
}

fn tier_label(tier: AgeTier) -> &'static str {
    match tier {
        AgeTier::Kids => "Kids",
        AgeTier::Teens => "Teens",
        AgeTier::Adults => "Adults",
    }
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>The 7 Habits</title>
  <style>
    :root {
      --ink: #2b2a28;
      --card: rgba(255, 255, 255, 0.9);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
      --kids: #ec4899;
      --teens: #3b82f6;
      --adults: #8b5cf6;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: linear-gradient(135deg, #fdf2f8, #eff6ff 50%, #f5f3ff 100%);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(960px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 36px;
      display: grid;
      gap: 28px;
    }

    h1 {
      font-family: "Georgia", serif;
      margin: 0;
    }

    .subtitle {
      margin: 6px 0 0;
      color: #5f5c57;
    }

    .tiers {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(280px, 1fr));
      gap: 16px;
    }

    .tier {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border-top: 6px solid var(--accent);
    }

    .tier.kids { --accent: var(--kids); }
    .tier.teens { --accent: var(--teens); }
    .tier.adults { --accent: var(--adults); }

    .tier h2 {
      margin: 0 0 12px;
      color: var(--accent);
    }

    ul {
      list-style: none;
      margin: 0;
      padding: 0;
      display: grid;
      gap: 10px;
    }

    li {
      display: grid;
      grid-template-columns: 1fr auto auto;
      align-items: center;
      gap: 8px;
      font-size: 0.9rem;
    }

    .streak {
      font-weight: 600;
      color: var(--accent);
    }

    button.done {
      appearance: none;
      border: none;
      border-radius: 999px;
      padding: 6px 10px;
      background: var(--accent);
      color: white;
      cursor: pointer;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>The 7 Habits</h1>
      <p class="subtitle">{{DATE}} &middot; streaks shown as current / best</p>
    </header>
    <div class="tiers">
    {{TIERS}}
    </div>
  </main>
  <script>
    document.querySelectorAll("button.done").forEach((button) => {
      button.addEventListener("click", async () => {
        const response = await fetch(button.dataset.path, { method: "POST" });
        if (!response.ok) {
          alert(await response.text());
          return;
        }
        window.location.reload();
      });
    });
  </script>
</body>
</html>
"#;
