//! Browser-side interaction shipped to the render service
//!
//! The documentation site loads the request/response parameter tables lazily
//! behind two tabs. The script below runs inside the rendered page, opens both
//! tabs and leaves a completion tag on `<body>` that the wait condition
//! watches for. The crate never interprets the script itself.

/// Elements whose presence means the page has documentation content
pub const CONTENT_MARKERS: &str = ".containerFlex, .el-table, table, .api-section, .doc-title, h1";

/// Set on `<body>` when no content marker appeared within the wait budget
pub const EMPTY_TAG: &str = "data-page-empty";

/// Set on `<body>` when both tabs were opened
pub const TABS_TAG: &str = "data-tabs-clicked";

/// Set on `<body>` when content exists but a tab could not be opened
pub const PROCESSED_TAG: &str = "data-content-processed";

/// Any completion tag, or a rendered table, ends the wait
pub const WAIT_CONDITION: &str = "[data-tabs-clicked='true'], [data-page-empty='true'], [data-content-processed='true'], .el-table, table";

const SCRIPT_TEMPLATE: &str = r#"
Object.defineProperty(navigator, 'userAgent', { value: '__USER_AGENT__', writable: false });
Object.defineProperty(navigator, 'language', { value: '__LOCALE__', writable: false });

function hasContent() {
    return document.querySelector('__CONTENT_MARKERS__') !== null;
}

const sleep = (ms) => new Promise(resolve => setTimeout(resolve, ms));

async function waitForContent(timeout) {
    const startTime = Date.now();
    while (!hasContent()) {
        if (Date.now() - startTime > timeout) {
            return false;
        }
        await sleep(100);
    }
    return true;
}

function waitForElement(selector, timeout) {
    return new Promise((resolve, reject) => {
        const startTime = Date.now();
        const check = () => {
            const element = document.querySelector(selector);
            if (element) {
                resolve(element);
                return;
            }
            if (Date.now() - startTime > timeout) {
                reject(new Error('timed out waiting for ' + selector));
                return;
            }
            setTimeout(check, 100);
        };
        check();
    });
}

async function main() {
    if (!(await waitForContent(__WAIT_TIMEOUT_MS__))) {
        document.body.setAttribute('__EMPTY_TAG__', 'true');
        return;
    }
    try {
        const requestTab = await waitForElement('#tab-request0', __WAIT_TIMEOUT_MS__);
        requestTab.click();
        await sleep(__SETTLE_MS__);

        const responseTab = await waitForElement('#tab-response0', __WAIT_TIMEOUT_MS__);
        responseTab.click();
        await sleep(__SETTLE_MS__);

        document.body.setAttribute('__TABS_TAG__', 'true');
    } catch (error) {
        document.body.setAttribute('__PROCESSED_TAG__', 'true');
        console.error('tab interaction failed:', error);
    }
}

main();
"#;

/// Pause after each tab click so the tab's table can render
pub const TAB_SETTLE_MS: u64 = 1_000;

/// Builds the interaction script for one render
///
/// `wait_timeout_ms` bounds the wait for content and every element wait
/// inside the page; it is independent of the whole-page budget enforced by the
/// render service. A page is tagged empty only after the content wait runs out.
pub fn interaction_script(user_agent: &str, locale: &str, wait_timeout_ms: u64) -> String {
    SCRIPT_TEMPLATE
        .replace("__USER_AGENT__", &escape_js(user_agent))
        .replace("__LOCALE__", &escape_js(locale))
        .replace("__CONTENT_MARKERS__", CONTENT_MARKERS)
        .replace("__EMPTY_TAG__", EMPTY_TAG)
        .replace("__TABS_TAG__", TABS_TAG)
        .replace("__PROCESSED_TAG__", PROCESSED_TAG)
        .replace("__WAIT_TIMEOUT_MS__", &wait_timeout_ms.to_string())
        .replace("__SETTLE_MS__", &TAB_SETTLE_MS.to_string())
}

fn escape_js(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}
