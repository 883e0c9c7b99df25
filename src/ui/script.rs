/// Injected before any page script runs. Exposes `window.docshell` (and a
/// `window.pywebview.api` alias for frontends written against pywebview)
/// whose methods return promises resolved by the host. Call ids are prefixed
/// with a token drawn per page load.
pub const BRIDGE_SCRIPT: &str = r#"(function () {
  if (window.docshell) {
    return;
  }

  var pending = new Map();
  var token = Math.random().toString(36).slice(2, 10) + Date.now().toString(36);
  var nextId = 1;

  Object.defineProperty(window, "__docshellResolve", {
    value: function (id, result) {
      var resolve = pending.get(id);
      if (!resolve) {
        return;
      }
      pending.delete(id);
      resolve(result);
    },
    writable: false,
    configurable: false,
  });

  function call(method, documentId, filename) {
    return new Promise(function (resolve) {
      var id = token + ":" + nextId++;
      pending.set(id, resolve);
      window.ipc.postMessage(
        JSON.stringify({
          id: id,
          method: method,
          params: [String(documentId), filename == null ? "" : String(filename)],
        })
      );
    });
  }

  var api = Object.freeze({
    download_file: function (documentId, filename) {
      return call("download_file", documentId, filename);
    },
    download: function (documentId, filename) {
      return call("download", documentId, filename);
    },
  });

  window.docshell = api;
  window.pywebview = window.pywebview || {};
  window.pywebview.api = api;

  function announce() {
    window.dispatchEvent(new Event("pywebviewready"));
    window.dispatchEvent(new Event("docshellready"));
  }
  if (document.readyState === "loading") {
    document.addEventListener("DOMContentLoaded", announce);
  } else {
    announce();
  }
})();
"#;
