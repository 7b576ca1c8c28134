//! Injected page functions.
//!
//! Every script is a self-contained function expression over plain JSON
//! arguments. Scripts only collect raw page data or perform one DOM action;
//! parsing happens in Rust.

use crate::page::Script;

pub const LOGIN_INDICATORS: Script = Script::new(
	"login-indicators",
	r#"() => {
	const body = (document.body && document.body.innerText) || '';
	return {
		hasLogout: body.includes('Log out') || body.includes('Logout'),
		hasMyEvents: body.includes('My events'),
		hasOrganizer: body.includes('Organizer'),
	};
}"#,
);

pub const CLASSIC_LOGIN: &[Script] = &[
	Script::new(
		"classic-login-text",
		r#"() => {
	for (const el of document.querySelectorAll('a, button, div, span')) {
		if ((el.textContent || '').includes('Classic Login')) {
			el.click();
			return true;
		}
	}
	return false;
}"#,
	),
	Script::new(
		"classic-login-class",
		r#"() => {
	const el = document.querySelector('[class*="classic"], [class*="email-login"]');
	if (!el) return false;
	el.click();
	return true;
}"#,
	),
];

/// Fills both credential fields found by the given selectors, dispatching
/// `input` and `change` so client-side form frameworks pick the values up.
macro_rules! fill_credentials {
	($name:literal, $user:literal, $pass:literal) => {
		Script::new(
			$name,
			concat!(
				r#"({ email, password }) => {
	const user = document.querySelector('"#,
				$user,
				r#"');
	const pass = document.querySelector('"#,
				$pass,
				r#"');
	if (!user || !pass) return false;
	user.value = email;
	pass.value = password;
	for (const field of [user, pass]) {
		field.dispatchEvent(new Event('input', { bubbles: true }));
		field.dispatchEvent(new Event('change', { bubbles: true }));
	}
	return true;
}"#
			),
		)
	};
}

pub const FILL_CREDENTIALS: &[Script] = &[
	fill_credentials!("credentials-by-id", "#Username", "#Password"),
	fill_credentials!("credentials-by-name", r#"[name="Username"]"#, r#"[name="Password"]"#),
	fill_credentials!(
		"credentials-by-type",
		r#"input[type="email"], input[placeholder*="email" i], #Username, [name="Username"]"#,
		r#"input[type="password"]"#
	),
];

pub const SUBMIT_LOGIN: &[Script] = &[
	Script::new(
		"form-submit-control",
		r#"() => {
	const anchor = document.querySelector('#Username') || document.querySelector('input[type="password"]');
	const form = anchor && anchor.closest('form');
	if (!form) return false;
	const button = form.querySelector('button[type="submit"], input[type="submit"]');
	if (!button) return false;
	button.click();
	return true;
}"#,
	),
	Script::new(
		"login-labelled-button",
		r#"() => {
	for (const button of document.querySelectorAll('button, input[type="submit"]')) {
		const label = ((button.textContent || '') + ' ' + (button.value || '')).toLowerCase();
		if (label.includes('log in') || label.includes('sign in')) {
			button.click();
			return true;
		}
	}
	return false;
}"#,
	),
	Script::new(
		"native-form-submit",
		r#"() => {
	const anchor = document.querySelector('#Username') || document.querySelector('input[type="password"]');
	const form = anchor && anchor.closest('form');
	if (!form) return false;
	form.submit();
	return true;
}"#,
	),
];

pub const SESSION_ID: &[Script] = &[
	Script::new(
		"session-id-url-param",
		r#"() => new URLSearchParams(window.location.search).get('sessionId')"#,
	),
	Script::new(
		"session-id-track-link-html",
		r#"() => {
	const match = document.body.innerHTML.match(/href="[^"]*sessionId=(\d+)[^"]*"[^>]*>\s*\[Track/);
	return match ? match[1] : null;
}"#,
	),
	Script::new(
		"session-id-track-link",
		r#"() => {
	for (const link of document.querySelectorAll('a[href*="sessionId="]')) {
		if ((link.textContent || '').includes('[Track')) {
			const match = link.href.match(/sessionId=(\d+)/);
			return match ? match[1] : null;
		}
	}
	return null;
}"#,
	),
	Script::new(
		"session-id-first-link",
		r#"() => {
	const link = document.querySelector('a[href*="sessionId="]');
	const match = link && link.href.match(/sessionId=(\d+)/);
	return match ? match[1] : null;
}"#,
	),
];

/// Rendered text plus the rating widgets' state.
pub const SESSION_SNAPSHOT: Script = Script::new(
	"session-snapshot",
	r#"() => {
	const widgets = Array.from(document.querySelectorAll('.rating.jq-ry-container'));
	const ratings = [];
	const criteria = [];
	for (const el of widgets) {
		if (window.jQuery && jQuery(el).rateYo) {
			ratings.push(Number(jQuery(el).rateYo('rating')) || 0);
		}
		const row = el.closest('div[class*="criteria"], div[class*="rating-row"], tr, .form-group');
		const label = row && row.querySelector('label, th, .criteria-name');
		if (label) criteria.push(label.textContent.trim());
	}
	return {
		bodyText: (document.body && document.body.innerText) || '',
		url: window.location.href,
		ratings,
		criteria,
	};
}"#,
);

pub const SESSION_LINKS: Script = Script::new(
	"session-links",
	r#"() => Array.from(document.querySelectorAll('a[href*="sessionId="]')).map((link) => {
	const match = link.href.match(/sessionId=(\d+)/);
	return {
		sessionId: match ? match[1] : null,
		title: (link.textContent || '').trim(),
		href: link.href,
	};
})"#,
);

/// Applies all ratings or none.
pub const SET_RATINGS: Script = Script::new(
	"set-ratings",
	r#"({ ratings }) => {
	const widgets = Array.from(document.querySelectorAll('.rating.jq-ry-container'));
	const scriptable = !!window.jQuery && widgets.every((el) => !!jQuery(el).rateYo);
	if (widgets.length !== ratings.length || !scriptable) {
		return { widgets: widgets.length, scriptable, applied: [] };
	}
	const applied = widgets.map((el, index) => {
		jQuery(el).rateYo('rating', ratings[index]);
		return { index, rating: ratings[index] };
	});
	return { widgets: widgets.length, scriptable, applied };
}"#,
);

// Comment strategies set the raw value only. Dispatching change events can
// trigger the page's own auto-add wiring.
pub const SET_COMMENT: &[Script] = &[
	Script::new(
		"comment-by-attribute",
		r#"({ text }) => {
	const area = document.querySelector('textarea[name*="comment" i]')
		|| document.querySelector('textarea[id*="comment" i]')
		|| document.querySelector('textarea[placeholder*="comment" i]');
	if (!area) return false;
	area.value = text;
	return true;
}"#,
	),
	Script::new(
		"comment-near-label",
		r#"({ text }) => {
	for (const label of document.querySelectorAll('label, span, div')) {
		const content = (label.textContent || '').toLowerCase();
		if (!content.includes('comment') && !content.includes('note')) continue;
		const scope = label.closest('div, section, form');
		const area = scope && scope.querySelector('textarea');
		if (area) {
			area.value = text;
			return true;
		}
	}
	return false;
}"#,
	),
	Script::new(
		"comment-sole-textarea",
		r#"({ text }) => {
	const areas = document.querySelectorAll('textarea');
	if (areas.length !== 1) return false;
	areas[0].value = text;
	return true;
}"#,
	),
	Script::new(
		"comment-largest-textarea",
		r#"({ text }) => {
	let best = null;
	let bestArea = 0;
	for (const area of document.querySelectorAll('textarea')) {
		const rect = area.getBoundingClientRect();
		const size = rect.width * rect.height;
		if (size > bestArea) {
			best = area;
			bestArea = size;
		}
	}
	if (!best) return false;
	best.value = text;
	return true;
}"#,
	),
];

pub const SAVE_AND_CONTINUE: &[Script] = &[
	Script::new(
		"save-button",
		r#"() => {
	const button = document.querySelector('.js-save-button');
	if (!button) return false;
	button.classList.remove('disabled');
	button.removeAttribute('disabled');
	button.click();
	return true;
}"#,
	),
	Script::new(
		"save-continue-text",
		r#"() => {
	for (const button of document.querySelectorAll('button, a, div[role="button"]')) {
		const label = button.textContent || '';
		if (label.includes('Save and continue') || label.includes('Save & continue')) {
			button.click();
			return true;
		}
	}
	return false;
}"#,
	),
	Script::new(
		"submit-control",
		r#"() => {
	const button = document.querySelector('button[type="submit"], input[type="submit"]');
	if (!button) return false;
	button.click();
	return true;
}"#,
	),
];

/// Profile-like links, plus the text of session containers mentioning `query`.
pub const SPEAKER_SCAN: Script = Script::new(
	"speaker-scan",
	r#"({ query }) => {
	const needle = query.toLowerCase();
	const links = Array.from(document.querySelectorAll('a[href*="speaker"], a[href*="profile"]'))
		.map((link) => ({ name: (link.textContent || '').trim(), href: link.href }));
	const containers = Array.from(document.querySelectorAll('[class*="session"], [class*="submission"], tr'))
		.map((el) => el.innerText || '')
		.filter((text) => text.toLowerCase().includes(needle));
	return { links, containers };
}"#,
);

pub const SPEAKER_SESSIONS: Script = Script::new(
	"speaker-sessions",
	r#"({ name }) => {
	const needle = name.toLowerCase();
	const results = [];
	for (const link of document.querySelectorAll('a[href*="sessionId="]')) {
		const container = link.closest('[class*="session"], [class*="submission"], tr, div');
		if (!container || !(container.innerText || '').toLowerCase().includes(needle)) continue;
		const match = link.href.match(/sessionId=(\d+)/);
		results.push({
			sessionId: match ? match[1] : null,
			title: (link.textContent || '').trim(),
			url: link.href,
		});
	}
	return results;
}"#,
);
