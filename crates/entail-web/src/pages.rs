use entail_common::EndpointState;

pub const DEFAULT_PREMISE: &str = "A man is awake";

const LOADING_PAGE: &str = r#"<!doctype html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <meta name="viewport" content="width=device-width, initial-scale=1" />
        <meta http-equiv="refresh" content="20" />
        <title>Textual Entailment</title>
        <style>
            body {
                margin: 0;
                min-height: 100vh;
                display: grid;
                place-items: center;
                font-family: system-ui, sans-serif;
                background: #f6f2ea;
                color: #1b1b1b;
            }
            .card {
                background: #fff;
                border-radius: 14px;
                padding: 28px 32px;
                box-shadow: 0 8px 24px rgba(0, 0, 0, 0.08);
                text-align: center;
                max-width: 420px;
            }
            .spinner {
                width: 36px;
                height: 36px;
                margin: 0 auto 16px;
                border: 4px solid #e2dccf;
                border-top-color: #0d5c63;
                border-radius: 50%;
                animation: spin 1s linear infinite;
            }
            @keyframes spin { to { transform: rotate(360deg); } }
        </style>
    </head>
    <body>
        <div class="card">
            <div class="spinner"></div>
            <h2>Starting the model</h2>
            <p>The inference endpoint is warming up. This takes a few minutes; the page reloads on its own.</p>
        </div>
    </body>
</html>
"#;

const INDEX_PAGE: &str = r#"<!doctype html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <meta name="viewport" content="width=device-width, initial-scale=1" />
        <title>Textual Entailment</title>
        <style>
            :root { --accent: #0d5c63; --ok: #2e7d32; --bad: #b23a2b; --muted: #6b6b6b; }
            body { margin: 0; font-family: system-ui, sans-serif; background: #f6f2ea; color: #1b1b1b; }
            main { max-width: 640px; margin: 40px auto; padding: 0 20px; display: grid; gap: 18px; }
            .card { background: #fff; border-radius: 14px; padding: 18px 20px; box-shadow: 0 8px 24px rgba(0, 0, 0, 0.08); }
            .premise { font-size: 18px; }
            label { display: block; color: var(--muted); font-size: 13px; margin-bottom: 6px; }
            input, select { width: 100%; padding: 10px; font-size: 16px; border: 1px solid #d8d2c6; border-radius: 8px; box-sizing: border-box; }
            button { padding: 10px 18px; font-size: 16px; border: 0; border-radius: 8px; background: var(--accent); color: #fff; cursor: pointer; }
            button:disabled { opacity: 0.6; cursor: wait; }
            .Success { color: var(--ok); }
            .Fail { color: var(--bad); }
            pre { white-space: pre-wrap; color: var(--muted); }
        </style>
    </head>
    <body>
        <main>
            <div class="card">
                <label>Premise</label>
                <div class="premise" id="premise">{{PREMISE}}</div>
            </div>
            <form class="card" id="form">
                <label for="task">Write a sentence that the premise…</label>
                <select id="task">
                    <option value="Entailment">entails (Entailment)</option>
                    <option value="Contradiction">contradicts (Contradiction)</option>
                    <option value="Neutral">says nothing about (Neutral)</option>
                </select>
                <p></p>
                <label for="hypothesis">Hypothesis</label>
                <input id="hypothesis" autocomplete="off" required />
                <p></p>
                <button id="submit" type="submit">Check</button>
            </form>
            <div class="card" id="result" hidden>
                <h3 id="status"></h3>
                <pre id="feedback"></pre>
            </div>
        </main>
        <script>
            const form = document.getElementById("form");
            const submit = document.getElementById("submit");
            form.addEventListener("submit", async (ev) => {
                ev.preventDefault();
                submit.disabled = true;
                const body = {
                    hypothesis: { "0": document.getElementById("hypothesis").value },
                    premise: { "0": document.getElementById("premise").textContent },
                    task: { "0": document.getElementById("task").value },
                };
                let status = "Fail";
                let feedback = "";
                try {
                    const resp = await fetch(window.location.pathname, {
                        method: "POST",
                        headers: { "Content-Type": "application/json" },
                        body: JSON.stringify(body),
                    });
                    const data = await resp.json();
                    status = data.successStatus || "Fail";
                    feedback = data.jsonFeedback || data.error || "";
                } catch (err) {
                    feedback = String(err);
                }
                const statusEl = document.getElementById("status");
                statusEl.textContent = status === "Success" ? "The model agrees." : "The model disagrees.";
                statusEl.className = status;
                document.getElementById("feedback").textContent = feedback;
                document.getElementById("result").hidden = false;
                submit.disabled = false;
            });
        </script>
    </body>
</html>
"#;

/// Interactive page when the endpoint is in service, loading page otherwise.
pub fn page_for(state: &EndpointState, premise: &str) -> String {
    if state.is_in_service() {
        render_index(premise)
    } else {
        LOADING_PAGE.to_string()
    }
}

pub fn render_index(premise: &str) -> String {
    INDEX_PAGE.replace("{{PREMISE}}", &escape_html(premise))
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
