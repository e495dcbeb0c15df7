use axum::{response::Html, routing::get, Router};

pub fn router() -> Router {
    Router::new().route("/", get(index))
}

async fn index() -> Html<&'static str> {
    Html(r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>Sheet Insight</title>
  <style>
    body { font-family: Arial, sans-serif; margin: 2rem auto; max-width: 1100px; color: #1d1d1f; }
    h1 { margin-bottom: 0.25rem; }
    nav button { margin-right: 0.5rem; }
    .card { border: 1px solid #ddd; padding: 1rem; border-radius: 8px; margin: 1rem 0; }
    .hidden { display: none; }
    .error { color: #b00020; }
    .badge { display: inline-block; background: #eef; border-radius: 4px; padding: 0 0.4rem; margin: 0.1rem; }
    label { display: block; margin-top: 0.5rem; font-weight: 600; }
    input[type=text], input[type=password], select { width: 100%; padding: 0.4rem; }
    table { border-collapse: collapse; width: 100%; font-size: 0.9rem; }
    td, th { border: 1px solid #ddd; padding: 0.25rem 0.5rem; text-align: left; }
    button { margin-top: 0.75rem; padding: 0.5rem 1rem; }
  </style>
</head>
<body>
  <h1>Sheet Insight</h1>
  <p>Upload an XLSX or CSV file to identify names, dates and times, then enrich it with an AI summary.</p>

  <nav>
    <button data-tab="upload">Upload</button>
    <button data-tab="data">Processed data</button>
    <button data-tab="config">AI configuration</button>
  </nav>

  <section id="upload" class="card tab">
    <h2>Upload file</h2>
    <input id="fileInput" type="file" accept=".xlsx,.xls,.csv" />
    <button id="uploadBtn">Upload</button>
    <p id="uploadStatus"></p>
    <div id="aiBox" class="hidden">
      <label for="provider">Provider</label>
      <select id="provider">
        <option value="zai">Z.AI</option>
        <option value="gemini">Google Gemini</option>
        <option value="deepseek">DeepSeek</option>
      </select>
      <button id="analyzeBtn">Analyze with AI</button>
    </div>
  </section>

  <section id="data" class="card tab hidden">
    <h2>Processed data</h2>
    <div id="dataView">No data loaded. Upload a file first.</div>
  </section>

  <section id="config" class="card tab hidden">
    <h2>AI configuration</h2>
    <div id="configForms"></div>
    <button id="saveConfigBtn">Save configuration</button>
    <p id="configStatus"></p>
  </section>

  <script>
    const $ = (id) => document.getElementById(id);
    const providers = ['gemini', 'deepseek', 'zai'];
    const escapeHtml = (s) => String(s ?? '').replace(/[&<>"]/g, c => ({'&':'&amp;','<':'&lt;','>':'&gt;','"':'&quot;'}[c]));

    document.querySelectorAll('nav button').forEach(btn => btn.addEventListener('click', () => {
      document.querySelectorAll('.tab').forEach(t => t.classList.add('hidden'));
      $(btn.dataset.tab).classList.remove('hidden');
      if (btn.dataset.tab === 'data') loadData();
    }));

    function badges(values) {
      return values.length ? values.map(v => `<span class="badge">${escapeHtml(v)}</span>`).join('') : '<em>none</em>';
    }

    function renderData(data) {
      const rows = data.rawData.map(row =>
        '<tr>' + row.map(c => `<td>${escapeHtml(c)}</td>`).join('') + '</tr>').join('');
      const ai = data.aiAnalysis ? `
        <h3>AI analysis (${escapeHtml(data.aiAnalysis.provider)})</h3>
        <p>${escapeHtml(data.aiAnalysis.summary)}</p>
        <ul>${data.aiAnalysis.insights.map(i => `<li>${escapeHtml(i)}</li>`).join('')}</ul>` : '';
      $('dataView').innerHTML = `
        <p><strong>${escapeHtml(data.fileName)}</strong></p>
        <table>
          <tr><th>Category</th><th>Identified values</th><th>Count</th></tr>
          <tr><td>Names</td><td>${badges(data.names)}</td><td>${data.names.length}</td></tr>
          <tr><td>Dates</td><td>${badges(data.dates)}</td><td>${data.dates.length}</td></tr>
          <tr><td>Times</td><td>${badges(data.times)}</td><td>${data.times.length}</td></tr>
        </table>
        ${ai}
        <h3>Raw data</h3>
        <p>Showing first ${data.rawData.length} rows of ${data.totalRows}</p>
        <table>${rows}</table>`;
    }

    async function loadData() {
      const res = await fetch('/api/files/current');
      if (res.ok) renderData(await res.json());
    }

    $('uploadBtn').addEventListener('click', async () => {
      const input = $('fileInput');
      if (!input.files.length) {
        $('uploadStatus').textContent = 'Select a file first.';
        return;
      }
      const formData = new FormData();
      formData.append('file', input.files[0]);
      $('uploadStatus').textContent = 'Analyzing data and identifying names, dates and times...';
      const res = await fetch('/api/files', { method: 'POST', body: formData });
      const json = await res.json();
      if (res.ok) {
        $('uploadStatus').textContent = `File processed successfully: ${json.fileName}. Open "Processed data" to see the results.`;
        $('uploadStatus').className = '';
        $('aiBox').classList.remove('hidden');
        renderData(json);
      } else {
        $('uploadStatus').textContent = json.error;
        $('uploadStatus').className = 'error';
      }
    });

    $('analyzeBtn').addEventListener('click', async () => {
      $('analyzeBtn').disabled = true;
      $('uploadStatus').textContent = 'Analyzing...';
      const res = await fetch('/api/files/current/analyze', {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify({ provider: $('provider').value })
      });
      const json = await res.json();
      $('analyzeBtn').disabled = false;
      if (res.ok) {
        $('uploadStatus').textContent = 'AI analysis complete.';
        $('uploadStatus').className = '';
        renderData(json);
      } else {
        $('uploadStatus').textContent = json.details || json.error;
        $('uploadStatus').className = 'error';
      }
    });

    async function loadConfig() {
      const [settingsRes, catalogueRes] = await Promise.all([
        fetch('/api/settings'), fetch('/api/settings/providers')
      ]);
      const settings = await settingsRes.json();
      const catalogue = await catalogueRes.json();
      $('configForms').innerHTML = catalogue.map(p => {
        const s = settings[p.id];
        const models = p.models.some(m => m.id === s.model) || !s.model
          ? p.models
          : [{ id: s.model, name: s.model + ' (custom)' }, ...p.models];
        const options = models.map(m =>
          `<option value="${escapeHtml(m.id)}" ${m.id === s.model ? 'selected' : ''}>${escapeHtml(m.name)}</option>`).join('');
        return `
          <fieldset>
            <legend>${escapeHtml(p.name)}</legend>
            <label><input type="checkbox" id="${p.id}-enabled" ${s.enabled ? 'checked' : ''}/> Enabled</label>
            <label>API key ${s.hasKey ? '(' + escapeHtml(s.keyHint) + ')' : ''}</label>
            <input type="password" id="${p.id}-key" placeholder="Leave empty to keep the current key" />
            <label><input type="checkbox" id="${p.id}-clear-key" ${s.hasKey ? '' : 'disabled'}/> Remove stored key</label>
            <label>Model</label>
            <select id="${p.id}-model">${options}</select>
            <label>Base URL (optional)</label>
            <input type="text" id="${p.id}-url" placeholder="${p.default_base_url}" value="${escapeHtml(s.baseUrl)}" />
            <button data-test="${p.id}">Test connection</button>
            <span id="${p.id}-test"></span>
          </fieldset>`;
      }).join('');
      document.querySelectorAll('[data-test]').forEach(btn => btn.addEventListener('click', async () => {
        const id = btn.dataset.test;
        $(id + '-test').textContent = 'Testing connection...';
        const res = await fetch(`/api/settings/test/${id}`, { method: 'POST' });
        const json = await res.json();
        $(id + '-test').textContent = json.success ? json.message : json.error;
      }));
    }

    $('saveConfigBtn').addEventListener('click', async () => {
      for (const id of providers) {
        const update = {
          enabled: $(id + '-enabled').checked,
          model: $(id + '-model').value,
          baseUrl: $(id + '-url').value.trim()
        };
        const key = $(id + '-key').value.trim();
        if (key) update.apiKey = key;
        else if ($(id + '-clear-key').checked) update.apiKey = '';
        await fetch(`/api/settings/${id}`, {
          method: 'PATCH',
          headers: { 'Content-Type': 'application/json' },
          body: JSON.stringify(update)
        });
      }
      $('configStatus').textContent = 'Configuration saved successfully';
      loadConfig();
    });

    loadConfig();
  </script>
</body>
</html>"#)
}
