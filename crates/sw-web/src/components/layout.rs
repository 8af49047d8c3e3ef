use leptos::prelude::*;
use sw_common::prefs::{REFRESH_CHOICES, RefreshInterval};

use crate::components::toast::{Flash, FlashMessage};
use crate::i18n::{Key, Lang, t};

/// Top navigation entry of the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Dashboard,
    Manage,
    Security,
}

impl Nav {
    pub fn path(&self) -> &'static str {
        match self {
            Nav::Dashboard => "/",
            Nav::Manage => "/manage",
            Nav::Security => "/security",
        }
    }

    fn label(&self, lang: Lang) -> &'static str {
        match self {
            Nav::Dashboard => t(lang, Key::Dashboard),
            Nav::Manage => t(lang, Key::Config),
            Nav::Security => t(lang, Key::Security),
        }
    }
}

/// Everything the shell needs besides the page body.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub lang: Lang,
    pub nav: Nav,
    pub refresh: RefreshInterval,
    pub flash: Option<Flash>,
    /// Path the refresh selector and language switch return to.
    pub return_to: String,
}

impl PageContext {
    pub fn new(lang: Lang, nav: Nav, refresh: RefreshInterval) -> Self {
        Self {
            lang,
            nav,
            refresh,
            flash: None,
            return_to: nav.path().to_string(),
        }
    }

    pub fn with_flash(mut self, flash: Option<Flash>) -> Self {
        self.flash = flash;
        self
    }

    pub fn with_return_to(mut self, path: impl Into<String>) -> Self {
        self.return_to = path.into();
        self
    }
}

/// Fetches every `[data-fragment]` region on the interval and swaps its
/// markup in place. Interval changes arrive over `/events/refresh-interval`
/// and re-arm the timer, so a paused tab resumes without a reload; the
/// `X-Refresh-Interval` response header covers browsers without
/// `EventSource`.
const POLL_SCRIPT: &str = r#"
(function(){
  var interval = __MS__;
  var timer = null;
  var select = document.getElementById('refresh-select');
  function label(ms){
    return ms === 0 ? select.getAttribute('data-paused-label') : (ms / 1000) + 's';
  }
  function arm(ms){
    if (timer) { clearTimeout(timer); timer = null; }
    interval = ms;
    var ind = document.getElementById('refresh-indicator');
    if (ind) { ind.classList.toggle('paused', ms === 0); }
    if (select && select.value !== String(ms)) {
      var known = Array.prototype.some.call(select.options, function(o){ return o.value === String(ms); });
      if (!known) {
        var opt = document.createElement('option');
        opt.value = String(ms);
        opt.textContent = label(ms);
        select.appendChild(opt);
      }
      select.value = String(ms);
    }
    if (ms > 0) { timer = setTimeout(tick, ms); }
  }
  function tick(){
    var regions = document.querySelectorAll('[data-fragment]');
    var next = interval;
    var pending = regions.length;
    if (pending === 0) { arm(interval); return; }
    regions.forEach(function(el){
      fetch('/fragments/' + el.getAttribute('data-fragment'), {credentials: 'same-origin'})
        .then(function(r){
          if (r.status === 401) { window.location.href = '/login'; return null; }
          var h = r.headers.get('X-Refresh-Interval');
          if (h !== null && !isNaN(parseInt(h, 10))) { next = parseInt(h, 10); }
          return r.ok ? r.text() : null;
        })
        .then(function(html){ if (html !== null && html !== undefined) { el.innerHTML = html; } })
        .catch(function(){})
        .finally(function(){ pending -= 1; if (pending === 0) { arm(next); } });
    });
  }
  function refreshNow(){
    fetch('/refresh', {method: 'POST', credentials: 'same-origin'})
      .finally(function(){ window.location.reload(); });
  }
  if (select) { select.addEventListener('change', function(){ select.form.submit(); }); }
  var now = document.getElementById('refresh-now');
  if (now) { now.addEventListener('click', refreshNow); }
  if (window.EventSource) {
    var events = new EventSource('/events/refresh-interval');
    events.addEventListener('refresh-interval', function(e){
      var ms = parseInt(e.data, 10);
      if (!isNaN(ms) && ms !== interval) { arm(ms); }
    });
  }
  arm(interval);
})();
"#;

const INDICATOR: &str = "w-2 h-2 rounded-full bg-green-500";

fn refresh_label(ms: u64, lang: Lang) -> String {
    if ms == 0 {
        t(lang, Key::Paused).to_string()
    } else {
        format!("{}s", ms / 1000)
    }
}

#[component]
fn RefreshSelector(lang: Lang, refresh: RefreshInterval, return_to: String) -> impl IntoView {
    let current = refresh.millis();
    let mut choices: Vec<u64> = REFRESH_CHOICES.to_vec();
    if !choices.contains(&current) {
        choices.push(current);
        choices.sort_unstable();
    }
    let indicator = if refresh.is_paused() {
        format!("{INDICATOR} paused")
    } else {
        INDICATOR.to_string()
    };

    view! {
        <form method="post" action="/prefs/refresh-interval" class="flex items-center gap-2">
            <span id="refresh-indicator" class=indicator></span>
            <label class="text-xs text-gray-400">{t(lang, Key::Refresh)}</label>
            <select
                id="refresh-select"
                name="interval"
                data-paused-label=t(lang, Key::Paused)
                class="bg-gray-900 border border-gray-600 text-gray-200 text-xs px-2 py-1"
            >
                {choices.into_iter().map(|ms| view! {
                    <option value=ms.to_string() selected={ms == current}>{refresh_label(ms, lang)}</option>
                }).collect_view()}
            </select>
            <input type="hidden" name="return_to" value=return_to/>
            <button type="button" id="refresh-now" class="text-xs text-gray-400 hover:text-white" title="Refresh">
                "↻"
            </button>
        </form>
    }
}

#[component]
fn LanguageSwitch(lang: Lang, return_to: String) -> impl IntoView {
    view! {
        <form method="post" action="/set-lang" class="flex items-center gap-1" title=t(lang, Key::Language)>
            {[Lang::De, Lang::En].into_iter().map(|l| {
                let class = if l == lang {
                    "text-xs uppercase text-white font-semibold"
                } else {
                    "text-xs uppercase text-gray-500 hover:text-gray-300"
                };
                view! {
                    <button type="submit" name="lang" value=l.code() class=class>{l.code()}</button>
                }
            }).collect_view()}
            <input type="hidden" name="return_to" value=return_to/>
        </form>
    }
}

#[component]
fn NavLinks(lang: Lang, active: Nav) -> impl IntoView {
    [Nav::Dashboard, Nav::Manage, Nav::Security]
        .into_iter()
        .map(|n| {
            let class = if n == active {
                "px-3 py-2 text-sm text-white border-b-2 border-blue-500"
            } else {
                "px-3 py-2 text-sm text-gray-400 hover:text-white"
            };
            view! { <a href=n.path() class=class>{n.label(lang)}</a> }
        })
        .collect_view()
}

/// Bare HTML document.
#[component]
pub fn Shell(lang: Lang, #[prop(into)] title: String, children: Children) -> impl IntoView {
    view! {
        <!DOCTYPE html>
        <html lang=lang.code()>
            <head>
                <meta charset="utf-8"/>
                <meta name="viewport" content="width=device-width, initial-scale=1"/>
                <title>{format!("{title} - SIP Wrapper Admin")}</title>
                <script src="https://cdn.tailwindcss.com"></script>
                <style>"#refresh-indicator.paused{background-color:#6b7280}"</style>
            </head>
            <body class="bg-gray-900 text-gray-100 min-h-screen">
                {children()}
            </body>
        </html>
    }
}

/// Full console page: navigation, controls, flash and the poll script.
#[component]
pub fn Layout(ctx: PageContext, #[prop(into)] title: String, children: Children) -> impl IntoView {
    let lang = ctx.lang;
    let script = POLL_SCRIPT.replace("__MS__", &ctx.refresh.millis().to_string());

    view! {
        <Shell lang=lang title=title>
            <header class="bg-gray-800 border-b border-gray-700 px-6 flex items-center justify-between">
                <div class="flex items-center gap-6">
                    <span class="text-white font-semibold py-3">"SIP Wrapper Admin"</span>
                    <nav class="flex">
                        <NavLinks lang=lang active=ctx.nav/>
                    </nav>
                </div>
                <div class="flex items-center gap-4">
                    <RefreshSelector lang=lang refresh=ctx.refresh return_to=ctx.return_to.clone()/>
                    <LanguageSwitch lang=lang return_to=ctx.return_to.clone()/>
                    <a href="/logout" class="text-xs text-gray-400 hover:text-white">{t(lang, Key::Logout)}</a>
                </div>
            </header>
            <FlashMessage flash=ctx.flash.clone()/>
            <main class="pb-8">{children()}</main>
            <script>{script}</script>
        </Shell>
    }
}
