use crate::app_store::Tab;
use crate::models::{FastSnapshot, Protocol};

pub fn render_index(snapshot: &FastSnapshot, tab: Tab) -> String {
    let tab = serde_json::to_value(tab)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_else(|| "dashboard".to_string());
    let protocols: String = Protocol::ALL
        .iter()
        .map(|protocol| {
            format!(
                r#"<option value="{label}">{label} ({hours}h)</option>"#,
                label = protocol.label(),
                hours = protocol.target_hours()
            )
        })
        .collect();

    INDEX_HTML
        .replace("{{TITLE}}", &snapshot.title)
        .replace("{{ZONE}}", snapshot.zone)
        .replace("{{PROGRESS}}", &format!("{:.1}", snapshot.progress))
        .replace("{{TAB}}", &tab)
        .replace("{{PROTOCOLS}}", &protocols)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{TITLE}}</title>
  <style>
    @import url('https://fonts.googleapis.com/css2?family=Space+Grotesk:wght@400;500;600&family=Fraunces:wght@600&display=swap');

    :root {
      --bg-1: #eef4ee;
      --bg-2: #c9e4d2;
      --ink: #23302a;
      --accent: #2f8f6b;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.88);
      --shadow: 0 24px 60px rgba(47, 72, 88, 0.18);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: radial-gradient(circle at top, var(--bg-2), transparent 60%),
        linear-gradient(135deg, var(--bg-1), #e3f1e8 60%, #f4f8f4 100%);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      display: grid;
      place-items: center;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(900px, 100%);
      background: var(--card);
      border-radius: 28px;
      box-shadow: var(--shadow);
      padding: 32px;
      display: grid;
      gap: 24px;
    }

    h1 {
      font-family: "Fraunces", "Georgia", serif;
      margin: 0;
    }

    nav {
      display: flex;
      flex-wrap: wrap;
      gap: 6px;
      padding: 6px;
      background: rgba(47, 72, 88, 0.08);
      border-radius: 999px;
    }

    nav button {
      background: transparent;
      border: none;
      border-radius: 999px;
      padding: 8px 14px;
      font-weight: 600;
      color: #5d6b64;
      cursor: pointer;
    }

    nav button.active {
      background: white;
      color: var(--accent-2);
    }

    section[data-tab] {
      display: none;
      gap: 16px;
    }

    section[data-tab].active {
      display: grid;
    }

    .card {
      background: white;
      border-radius: 18px;
      padding: 18px;
      border: 1px solid rgba(47, 72, 88, 0.08);
      display: grid;
      gap: 10px;
    }

    .big {
      font-size: 2.4rem;
      font-weight: 600;
      color: var(--accent-2);
    }

    .bar {
      height: 14px;
      border-radius: 999px;
      background: rgba(47, 72, 88, 0.1);
      overflow: hidden;
    }

    .bar > div {
      height: 100%;
      background: var(--accent);
      transition: width 400ms ease;
    }

    button.primary {
      border: none;
      border-radius: 999px;
      padding: 12px 18px;
      font-weight: 600;
      background: var(--accent);
      color: white;
      cursor: pointer;
    }

    input, select, textarea {
      font: inherit;
      padding: 8px 10px;
      border-radius: 10px;
      border: 1px solid rgba(47, 72, 88, 0.2);
    }

    .row {
      display: flex;
      flex-wrap: wrap;
      gap: 10px;
      align-items: center;
    }

    .status {
      min-height: 1.2em;
      color: #5d6b64;
    }

    .status[data-type="error"] {
      color: #c63b2b;
    }

    .status[data-type="ok"] {
      color: #2d7a4b;
    }

    #toasts {
      position: fixed;
      right: 18px;
      bottom: 18px;
      display: grid;
      gap: 8px;
    }

    .toast {
      background: var(--accent-2);
      color: white;
      padding: 10px 14px;
      border-radius: 12px;
    }

    .toast[data-kind="error"] {
      background: #c63b2b;
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Fast Tracker</h1>
    </header>

    <nav id="nav">
      <button data-nav="dashboard">Dashboard</button>
      <button data-nav="timer">Timer</button>
      <button data-nav="tracking">Tracking</button>
      <button data-nav="analytics">Analytics</button>
      <button data-nav="social">Social</button>
      <button data-nav="recipes">Recipes</button>
      <button data-nav="settings">Settings</button>
    </nav>

    <section data-tab="dashboard">
      <div class="card">
        <span id="dash-title">{{TITLE}}</span>
        <div class="bar"><div id="dash-bar" style="width: {{PROGRESS}}%"></div></div>
      </div>
      <form class="card" id="checkin-form">
        <strong>Daily check-in</strong>
        <div class="row">
          <select name="sleep"><option value="poor">Poor sleep</option><option value="fair" selected>Fair sleep</option><option value="good">Good sleep</option></select>
          <select name="stress"><option value="high">High stress</option><option value="moderate" selected>Moderate stress</option><option value="low">Low stress</option></select>
          <select name="soreness"><option value="severe">Severe soreness</option><option value="mild" selected>Mild soreness</option><option value="none">No soreness</option></select>
          <label>Energy <input name="energy" type="number" min="1" max="10" value="6" /></label>
          <label>Motivation <input name="motivation" type="number" min="1" max="10" value="6" /></label>
          <button class="primary" type="submit">Check in</button>
        </div>
        <span id="checkin-result"></span>
      </form>
      <form class="card" id="coach-form">
        <strong>Coach</strong>
        <div class="row">
          <input name="question" placeholder="Ask about your fast" />
          <button class="primary" type="submit">Ask</button>
        </div>
        <p id="coach-reply"></p>
      </form>
    </section>

    <section data-tab="timer">
      <div class="card">
        <span class="big" id="elapsed">0:00:00</span>
        <span id="zone">{{ZONE}}</span>
        <div class="bar"><div id="progress" style="width: {{PROGRESS}}%"></div></div>
        <span id="remaining"></span>
      </div>
      <div class="row">
        <select id="protocol">{{PROTOCOLS}}</select>
        <input id="custom-hours" type="number" min="1" max="168" step="0.5" placeholder="Custom hours" />
        <button class="primary" data-fast="start">Start</button>
        <button class="primary" data-fast="pause">Pause</button>
        <button class="primary" data-fast="resume">Resume</button>
        <button class="primary" data-fast="end">End</button>
      </div>
    </section>

    <section data-tab="tracking">
      <form class="card row" data-log="weight"><input name="weight_kg" type="number" step="0.1" placeholder="Weight (kg)" /><button class="primary">Log weight</button></form>
      <form class="card row" data-log="hydration"><input name="amount_ml" type="number" placeholder="Water (ml)" /><button class="primary">Log water</button></form>
      <form class="card row" data-log="mood"><input name="mood" type="number" min="1" max="5" placeholder="Mood 1-5" /><input name="note" placeholder="Note" /><button class="primary">Log mood</button></form>
      <form class="card row" data-log="meal"><input name="description" placeholder="Meal" /><input name="calories" type="number" placeholder="kcal" /><button class="primary">Log meal</button></form>
    </section>

    <section data-tab="analytics">
      <div class="card" id="stats"></div>
    </section>

    <section data-tab="social">
      <div class="card" id="circles"></div>
    </section>

    <section data-tab="recipes">
      <form class="row" id="recipe-form"><input name="search" placeholder="Search recipes" /><input name="tag" placeholder="Tag" /><button class="primary">Search</button></form>
      <div class="card" id="recipes"></div>
    </section>

    <section data-tab="settings">
      <form class="card" id="settings-form">
        <label>Default protocol <select name="default_protocol">{{PROTOCOLS}}</select></label>
        <label>Hydration goal (ml) <input name="hydration_goal_ml" type="number" min="1" max="10000" /></label>
        <label><input name="notifications_enabled" type="checkbox" /> Notifications</label>
        <button class="primary">Save</button>
      </form>
    </section>

    <div class="status" id="status"></div>
  </main>
  <div id="toasts"></div>

  <script>
    const statusEl = document.getElementById('status');
    let snapshot = null;
    let fetchedAt = Date.now();
    let activeTab = '{{TAB}}';

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const api = async (path, options = {}) => {
      const res = await fetch(path, {
        headers: { 'content-type': 'application/json' },
        ...options
      });
      const body = await res.json().catch(() => ({ success: false, error: 'Request failed' }));
      if (res.status === 401 && body.login_url) {
        window.location.href = body.login_url;
      }
      if (!body.success) {
        throw new Error(body.error || 'Request failed');
      }
      return body.data;
    };

    const post = (path, payload) => api(path, { method: 'POST', body: JSON.stringify(payload || {}) });

    const pad = (n) => String(n).padStart(2, '0');
    const clock = (ms) => {
      const s = Math.floor(ms / 1000);
      return `${Math.floor(s / 3600)}:${pad(Math.floor(s / 60) % 60)}:${pad(s % 60)}`;
    };

    const liveElapsed = () => {
      if (!snapshot || !snapshot.fast) return 0;
      const paused = snapshot.fast.status === 'paused';
      return snapshot.elapsed_ms + (paused ? 0 : Date.now() - fetchedAt);
    };

    const renderTimer = () => {
      const elapsed = liveElapsed();
      const target = snapshot && snapshot.fast ? snapshot.fast.target_hours * 3600000 : 0;
      const pct = target > 0 ? Math.min(100, (elapsed / target) * 100) : 0;
      document.getElementById('elapsed').textContent = clock(elapsed);
      document.getElementById('progress').style.width = `${pct}%`;
      document.getElementById('dash-bar').style.width = `${pct}%`;
      document.getElementById('remaining').textContent =
        target > 0 ? `${clock(Math.max(0, target - elapsed))} remaining` : '';
    };

    const applySnapshot = (data) => {
      snapshot = data;
      fetchedAt = Date.now();
      document.getElementById('zone').textContent = data.zone;
      document.getElementById('dash-title').textContent = data.title;
      document.title = data.title;
      renderTimer();
    };

    const loadFast = async () => applySnapshot(await api('/api/fast'));
    const syncFast = async () => applySnapshot((await post('/api/fast/sync')).snapshot);

    const loadStats = async () => {
      const stats = await api('/api/stats');
      const weeks = stats.weekly_totals
        .map((w) => `<li>${w.week}: ${w.fasted_hours}h, ${w.fasts_completed} completed</li>`)
        .join('');
      document.getElementById('stats').innerHTML =
        `<strong>${stats.completed} completed (${stats.completion_rate}%), streak ${stats.current_streak_days} days</strong><ul>${weeks}</ul>`;
    };

    const loadCircles = async () => {
      const circles = await api('/api/circles');
      const el = document.getElementById('circles');
      el.replaceChildren(...circles.map((c) => {
        const row = document.createElement('div');
        row.className = 'row';
        const label = document.createElement('span');
        label.textContent = `${c.name} (${c.member_count})`;
        const button = document.createElement('button');
        button.className = 'primary';
        button.dataset.circle = c.id;
        button.dataset.action = c.is_member ? 'leave' : 'join';
        button.textContent = c.is_member ? 'Leave' : 'Join';
        row.append(label, button);
        return row;
      }));
      if (!circles.length) el.textContent = 'No circles yet';
    };

    const loadSettings = async () => {
      const settings = await api('/api/settings');
      const form = document.getElementById('settings-form');
      form.default_protocol.value = settings.default_protocol;
      form.hydration_goal_ml.value = settings.hydration_goal_ml;
      form.notifications_enabled.checked = settings.notifications_enabled;
    };

    const loaders = { analytics: loadStats, social: loadCircles, settings: loadSettings };

    const setActiveTab = (tab) => {
      activeTab = tab;
      document.querySelectorAll('section[data-tab]').forEach((s) => s.classList.toggle('active', s.dataset.tab === tab));
      document.querySelectorAll('[data-nav]').forEach((b) => b.classList.toggle('active', b.dataset.nav === tab));
      post('/api/nav', { tab }).catch(() => {});
      if (loaders[tab]) loaders[tab]().catch((err) => setStatus(err.message, 'error'));
    };

    const pollToasts = async () => {
      const toasts = await api('/api/toasts');
      const container = document.getElementById('toasts');
      toasts.forEach((toast) => {
        const el = document.createElement('div');
        el.className = 'toast';
        el.dataset.kind = toast.kind;
        el.textContent = toast.message;
        container.appendChild(el);
        setTimeout(() => el.remove(), 4000);
      });
    };

    document.querySelectorAll('[data-nav]').forEach((b) => b.addEventListener('click', () => setActiveTab(b.dataset.nav)));

    document.querySelectorAll('[data-fast]').forEach((b) => b.addEventListener('click', async () => {
      const action = b.dataset.fast;
      try {
        if (action === 'start') {
          const custom = parseFloat(document.getElementById('custom-hours').value);
          const payload = Number.isFinite(custom) ? { target_hours: custom } : { protocol: document.getElementById('protocol').value };
          applySnapshot(await post('/api/fast/start', payload));
        } else if (action === 'end') {
          const ended = await post('/api/fast/end');
          setStatus(`Fasted ${ended.fasted}`, 'ok');
          await loadFast();
        } else {
          applySnapshot(await post(`/api/fast/${action}`));
        }
      } catch (err) {
        setStatus(err.message, 'error');
      }
      pollToasts().catch(() => {});
    }));

    document.querySelectorAll('[data-log]').forEach((form) => form.addEventListener('submit', async (event) => {
      event.preventDefault();
      const payload = {};
      new FormData(form).forEach((value, key) => {
        if (value === '') return;
        payload[key] = form[key].type === 'number' ? Number(value) : value;
      });
      try {
        const receipt = await post(`/api/log/${form.dataset.log}`, payload);
        setStatus(receipt.queued ? 'Saved offline' : 'Saved', 'ok');
        form.reset();
      } catch (err) {
        setStatus(err.message, 'error');
      }
    }));

    document.getElementById('checkin-form').addEventListener('submit', async (event) => {
      event.preventDefault();
      const f = event.target;
      try {
        const result = await post('/api/checkin', {
          sleep: f.sleep.value, stress: f.stress.value, soreness: f.soreness.value,
          energy: Number(f.energy.value), motivation: Number(f.motivation.value)
        });
        document.getElementById('checkin-result').textContent =
          `Readiness ${result.score}: ${result.recommendation} (${result.protocol})`;
        document.getElementById('protocol').value = result.protocol;
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    document.getElementById('coach-form').addEventListener('submit', async (event) => {
      event.preventDefault();
      try {
        const reply = await post('/api/coaching', { topic: 'fasting', question: event.target.question.value });
        document.getElementById('coach-reply').textContent = reply.message;
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    document.getElementById('recipe-form').addEventListener('submit', async (event) => {
      event.preventDefault();
      const params = new URLSearchParams(new FormData(event.target));
      try {
        const recipes = await api(`/api/recipes?${params}`);
        const el = document.getElementById('recipes');
        el.replaceChildren(...recipes.map((r) => {
          const row = document.createElement('div');
          const title = document.createElement('strong');
          title.textContent = r.title;
          row.append(title, ` ${r.tags.join(', ')}`);
          return row;
        }));
        if (!recipes.length) el.textContent = 'No recipes found';
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    document.getElementById('circles').addEventListener('click', async (event) => {
      const id = event.target.dataset.circle;
      if (!id) return;
      try {
        await post(`/api/circles/${encodeURIComponent(id)}/${event.target.dataset.action}`);
        await loadCircles();
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    document.getElementById('settings-form').addEventListener('submit', async (event) => {
      event.preventDefault();
      const f = event.target;
      try {
        await api('/api/settings', {
          method: 'PUT',
          body: JSON.stringify({
            default_protocol: f.default_protocol.value,
            hydration_goal_ml: Number(f.hydration_goal_ml.value),
            notifications_enabled: f.notifications_enabled.checked
          })
        });
        setStatus('Settings saved', 'ok');
      } catch (err) {
        setStatus(err.message, 'error');
      }
    });

    document.addEventListener('visibilitychange', () => {
      if (document.visibilityState === 'visible') {
        syncFast().catch((err) => setStatus(err.message, 'error'));
      }
    });

    setInterval(renderTimer, 1000);
    setInterval(() => { document.title = snapshot ? snapshot.title : document.title; loadFast().catch(() => {}); }, 60000);
    setInterval(() => { syncFast().catch(() => {}); pollToasts().catch(() => {}); }, 30000);

    setActiveTab(activeTab);
    loadFast().catch((err) => setStatus(err.message, 'error'));
    pollToasts().catch(() => {});
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer;

    #[test]
    fn index_carries_title_and_tab() {
        let snapshot = timer::snapshot(None, chrono::Utc::now());
        let html = render_index(&snapshot, Tab::Recipes);
        assert!(html.contains("<title>Not fasting</title>"));
        assert!(html.contains("let activeTab = 'recipes';"));
        assert!(html.contains(r#"<option value="16:8">16:8 (16h)</option>"#));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn user_content_is_set_as_text() {
        let html = render_index(&timer::snapshot(None, chrono::Utc::now()), Tab::Social);
        for field in ["${c.name}", "${c.id}", "${r.title}"] {
            let interpolated = html
                .lines()
                .filter(|line| line.contains(field))
                .any(|line| line.contains("innerHTML") || line.contains('<'));
            assert!(!interpolated, "{field} is interpolated into markup");
        }
        assert!(html.contains("label.textContent = `${c.name} (${c.member_count})`;"));
        assert!(html.contains("title.textContent = r.title;"));
    }
}
